use serde::Serialize;

use crate::model::todo::Priority;
use crate::parse::parse_line;
use crate::util::unicode::{floor_char_boundary, word_start};

const DUE_KEYWORD: &str = "due:";

/// What the input line could complete at the cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    None,
    /// `(A)` through `(D)`
    Priority { candidates: Vec<String> },
    Project { query: String, candidates: Vec<String> },
    Area { query: String, candidates: Vec<String> },
    /// The word being typed could become `due:`
    DateKeyword,
}

/// Work out the suggestion for `text` with the cursor at byte offset `cursor`.
///
/// The word being typed runs from the last whitespace before the cursor up
/// to the cursor. Fields the rest of the line already sets are not
/// suggested again. Project and area candidates are the known names that
/// start with the typed query, ignoring case.
pub fn suggest(text: &str, cursor: usize, projects: &[String], areas: &[String]) -> Suggestion {
    let cursor = floor_char_boundary(text, cursor);
    let start = word_start(text, cursor);
    let word = &text[start..cursor];

    // The word under construction must not count as an existing field
    let rest = format!("{}{}", &text[..start], &text[cursor..]);
    let existing = parse_line(&rest);

    if text[..cursor].ends_with('(') && existing.priority.is_none() {
        return Suggestion::Priority {
            candidates: Priority::ALL.iter().map(|p| format!("({})", p)).collect(),
        };
    }
    if let Some(query) = word.strip_prefix('@')
        && existing.area_name.is_none()
    {
        return Suggestion::Area {
            query: query.to_string(),
            candidates: matching(areas, query),
        };
    }
    if let Some(query) = word.strip_prefix('+')
        && existing.project_name.is_none()
    {
        return Suggestion::Project {
            query: query.to_string(),
            candidates: matching(projects, query),
        };
    }
    if !word.is_empty()
        && DUE_KEYWORD.starts_with(&word.to_lowercase())
        && !existing.metadata.contains_key("due")
    {
        return Suggestion::DateKeyword;
    }
    Suggestion::None
}

fn matching(names: &[String], query: &str) -> Vec<String> {
    let query = query.to_lowercase();
    names
        .iter()
        .filter(|n| n.to_lowercase().starts_with(&query))
        .cloned()
        .collect()
}
