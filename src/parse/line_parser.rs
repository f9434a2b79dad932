use chrono::Utc;

use crate::model::todo::{MetaValue, Metadata, Priority, Todo, new_id};
use crate::parse::date::parse_date_token;

/// Parse one todo line into a `Todo`.
///
/// Tokens are consumed left to right: the `x ` completion marker and its
/// date, then a `(A)`-`(D)` priority (incomplete lines only), then a creation
/// date. Every remaining token is either an `@area`, a `+project`, a
/// `key:value` annotation, or a description word. Later `@`/`+` tokens
/// overwrite earlier ones.
///
/// Never fails: a malformed line just ends up with more of its text in the
/// description.
pub fn parse_line(line: &str) -> Todo {
    let trimmed = line.trim();
    let mut todo = Todo {
        id: new_id(),
        raw_text: trimmed.to_string(),
        description: String::new(),
        completed: false,
        completion_date: None,
        priority: None,
        created_at: Utc::now(),
        due_date: None,
        project_name: None,
        area_name: None,
        metadata: Metadata::new(),
    };

    let rest = match trimmed.strip_prefix("x ") {
        Some(after_marker) => {
            todo.completed = true;
            after_marker
        }
        None => trimmed,
    };
    let mut tokens = rest.split_whitespace().peekable();

    if todo.completed {
        if let Some(date) = tokens.peek().and_then(|t| parse_date_token(t)) {
            todo.completion_date = Some(date);
            tokens.next();
        }
    } else if let Some(priority) = tokens.peek().and_then(|t| Priority::from_token(t)) {
        todo.priority = Some(priority);
        tokens.next();
    }

    if let Some(date) = tokens.peek().and_then(|t| parse_date_token(t)) {
        todo.created_at = date;
        tokens.next();
    }

    let mut words = Vec::new();
    for token in tokens {
        match classify(token) {
            Token::Area(area) => todo.area_name = Some(area.to_string()),
            Token::Project(project) => todo.project_name = Some(project.to_string()),
            Token::Annotation(key, value) => {
                todo.metadata.insert(key.to_string(), MetaValue::from(value));
            }
            Token::Word(word) => words.push(word),
        }
    }

    todo.description = words.join(" ").trim().to_string();
    todo.due_date = todo
        .metadata
        .get("due")
        .and_then(MetaValue::as_str)
        .and_then(parse_date_token);
    todo
}

/// Parse a whole todo.txt file: one todo per non-blank line.
pub fn parse_file(content: &str) -> Vec<Todo> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

/// The description words of `text`, as they would survive in the body of a
/// line: every `@area`, `+project`, and `key:value` token is dropped and the
/// rest is joined with single spaces.
pub fn strip_tokens(text: &str) -> String {
    text.split_whitespace()
        .filter_map(|token| match classify(token) {
            Token::Word(word) => Some(word),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A token from the body of a line, after the positional prefix
enum Token<'a> {
    Area(&'a str),
    Project(&'a str),
    Annotation(&'a str, &'a str),
    Word(&'a str),
}

fn classify(token: &str) -> Token<'_> {
    if let Some(area) = token.strip_prefix('@').filter(|a| !a.is_empty()) {
        Token::Area(area)
    } else if let Some(project) = token.strip_prefix('+').filter(|p| !p.is_empty()) {
        Token::Project(project)
    } else if let Some((key, value)) = split_annotation(token) {
        Token::Annotation(key, value)
    } else {
        Token::Word(token)
    }
}

/// Split a `key:value` token on its first colon. The colon must be neither
/// the first nor the last character, and both halves must be non-empty.
fn split_annotation(token: &str) -> Option<(&str, &str)> {
    if token.starts_with(':') || token.ends_with(':') {
        return None;
    }
    let (key, value) = token.split_once(':')?;
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}
