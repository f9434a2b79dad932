use serde::Serialize;

use crate::model::lookup::LookupKind;
use crate::model::todo::{Metadata, Todo};
use crate::ops::filter::TodoStats;
use crate::parse::{format_date, format_line};
use crate::util::unicode::{pad_to_width, truncate_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoJson {
    pub id: String,
    pub text: String,
    pub raw_text: String,
    pub description: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

#[derive(Serialize)]
pub struct LookupListJson {
    pub kind: LookupKind,
    pub names: Vec<String>,
}

#[derive(Serialize)]
pub struct LookupChangeJson {
    pub kind: LookupKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_to: Option<String>,
    /// Todos repointed or detached
    pub todos_updated: usize,
}

#[derive(Serialize)]
pub struct DeleteJson {
    pub id: String,
    pub deleted: bool,
}

#[derive(Serialize)]
pub struct ImportJson {
    pub imported: usize,
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn todo_to_json(todo: &Todo) -> TodoJson {
    TodoJson {
        id: todo.id.clone(),
        text: format_line(todo),
        raw_text: todo.raw_text.clone(),
        description: todo.description.clone(),
        completed: todo.completed,
        completion_date: todo.completion_date.as_ref().map(format_date),
        priority: todo.display_priority().map(|p| p.to_string()),
        created_at: format_date(&todo.created_at),
        due_date: todo.due_date.as_ref().map(format_date),
        project: todo.project_name.clone(),
        area: todo.area_name.clone(),
        metadata: todo.metadata.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// One listing line: optional short id, then the canonical todo text.
/// `max_width` of 0 means no truncation.
pub fn format_todo_line(todo: &Todo, show_id: bool, max_width: usize) -> String {
    let line = if show_id {
        format!("{}  {}", todo.short_id(), format_line(todo))
    } else {
        format_line(todo)
    };
    if max_width == 0 {
        line
    } else {
        truncate_to_width(&line, max_width)
    }
}

/// Format detailed todo view
pub fn format_todo_detail(todo: &Todo) -> Vec<String> {
    let mut lines = Vec::new();
    let mut field = |label: &str, value: String| {
        lines.push(format!("{}{}", pad_to_width(label, 14), value));
    };

    field("id:", todo.id.clone());
    field("text:", format_line(todo));
    field("description:", todo.description.clone());
    field(
        "status:",
        if todo.completed { "completed" } else { "open" }.to_string(),
    );
    if let Some(priority) = todo.display_priority() {
        field("priority:", priority.to_string());
    }
    field("created:", format_date(&todo.created_at));
    if let Some(date) = &todo.completion_date {
        field("completed:", format_date(date));
    }
    if let Some(date) = &todo.due_date {
        field("due:", format_date(date));
    }
    if let Some(project) = &todo.project_name {
        field("project:", project.clone());
    }
    if let Some(area) = &todo.area_name {
        field("area:", area.clone());
    }
    for (key, value) in &todo.metadata {
        field("meta:", format!("{}:{}", key, value));
    }
    lines
}

pub fn format_stats(stats: &TodoStats) -> String {
    let mut line = format!(
        "{} todos: {} active, {} completed",
        stats.total, stats.active, stats.completed
    );
    if stats.filtered {
        line.push_str(" (filtered)");
    }
    line
}
