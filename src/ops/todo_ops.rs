use chrono::{DateTime, Utc};

use crate::io::store::Store;
use crate::model::lookup::LookupKind;
use crate::model::todo::{MetaValue, Metadata, Priority, Todo, new_id};
use crate::ops::lookup_ops::resolve;
use crate::ops::{OpError, Patch};
use crate::parse::{format_date, format_line, parse_date_token, parse_line, strip_tokens};

const DUE_KEY: &str = "due";

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Fields for a new todo. Project/area are raw names, resolved on create.
#[derive(Debug, Clone, Default)]
pub struct CreateInput {
    /// Text as typed; the canonical formatted line is stored when absent
    pub raw_text: Option<String>,
    pub description: String,
    pub completed: bool,
    pub completion_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    /// Defaults to now
    pub created_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub project_name: Option<String>,
    pub area_name: Option<String>,
    pub metadata: Metadata,
}

impl CreateInput {
    pub fn new(description: impl Into<String>) -> Self {
        CreateInput {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Carry over every field of a parsed todo, including its dates.
    pub fn from_todo(todo: Todo) -> Self {
        CreateInput {
            raw_text: Some(todo.raw_text),
            description: todo.description,
            completed: todo.completed,
            completion_date: todo.completion_date,
            priority: todo.priority,
            created_at: Some(todo.created_at),
            due_date: todo.due_date,
            project_name: todo.project_name,
            area_name: todo.area_name,
            metadata: todo.metadata,
        }
    }

    pub fn from_line(line: &str) -> Self {
        CreateInput::from_todo(parse_line(line))
    }
}

/// Validate and insert a new todo.
///
/// A completed todo without a completion date is stamped with now.
/// Project/area names go through the lookup-or-create resolver.
pub fn apply_create<S: Store + ?Sized>(store: &mut S, input: CreateInput) -> Result<Todo, OpError> {
    let description = check_description(&input.description)?;

    let now = Utc::now();
    let mut todo = Todo {
        id: new_id(),
        raw_text: String::new(),
        description,
        completed: input.completed,
        completion_date: if input.completed {
            input.completion_date.or(Some(now))
        } else {
            None
        },
        priority: input.priority,
        created_at: input.created_at.unwrap_or(now),
        due_date: None,
        project_name: resolve(store, LookupKind::Project, input.project_name.as_deref())?,
        area_name: resolve(store, LookupKind::Area, input.area_name.as_deref())?,
        metadata: input.metadata,
    };
    match input.due_date {
        Some(due) => set_due(&mut todo, Some(due)),
        None => todo.due_date = due_from_metadata(&todo.metadata),
    }
    todo.raw_text = input
        .raw_text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format_line(&todo));

    store.insert_todo(todo.clone())?;
    tracing::debug!(id = %todo.id, "created todo");
    Ok(todo)
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// A partial edit. Every field defaults to leaving the todo as it is.
#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub completion_date: Patch<DateTime<Utc>>,
    pub priority: Patch<Priority>,
    /// Kept in sync with the `due` metadata entry
    pub due_date: Patch<DateTime<Utc>>,
    pub project_name: Patch<String>,
    pub area_name: Patch<String>,
    /// Replaces the whole mapping; the due date is re-derived from it
    pub metadata: Option<Metadata>,
    /// Text to store as typed; otherwise the canonical line is stored
    pub raw_text: Option<String>,
}

/// Apply `patch` to the todo with `id` and store the result.
///
/// Completing a todo stamps `completion_date` with now, and reopening it
/// clears the date, unless the patch sets or clears the date itself.
pub fn apply_update<S: Store + ?Sized>(
    store: &mut S,
    id: &str,
    patch: TodoPatch,
) -> Result<Todo, OpError> {
    let mut todo = store
        .get_todo(id)?
        .ok_or_else(|| OpError::NotFound(format!("todo {}", id)))?;

    if let Some(description) = patch.description {
        todo.description = check_description(&description)?;
    }

    let was_completed = todo.completed;
    if let Some(completed) = patch.completed {
        todo.completed = completed;
    }
    if patch.completion_date.is_unchanged() {
        match (was_completed, todo.completed) {
            (false, true) => todo.completion_date = Some(Utc::now()),
            (true, false) => todo.completion_date = None,
            _ => {}
        }
    } else {
        patch.completion_date.apply_to(&mut todo.completion_date);
    }

    patch.priority.apply_to(&mut todo.priority);

    if let Some(metadata) = patch.metadata {
        todo.metadata = metadata;
        todo.due_date = due_from_metadata(&todo.metadata);
    }
    match patch.due_date {
        Patch::Unchanged => {}
        Patch::Set(due) => set_due(&mut todo, Some(due)),
        Patch::Clear => set_due(&mut todo, None),
    }

    for (kind, name) in [
        (LookupKind::Project, patch.project_name),
        (LookupKind::Area, patch.area_name),
    ] {
        match name {
            Patch::Unchanged => {}
            Patch::Set(name) => {
                *todo.reference_mut(kind) = resolve(store, kind, Some(name.as_str()))?;
            }
            Patch::Clear => *todo.reference_mut(kind) = None,
        }
    }

    todo.raw_text = patch
        .raw_text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format_line(&todo));

    store.update_todo(todo.clone())?;
    tracing::debug!(id = %todo.id, "updated todo");
    Ok(todo)
}

/// Flip `completed`, stamping or clearing the completion date.
pub fn toggle_completed<S: Store + ?Sized>(store: &mut S, id: &str) -> Result<Todo, OpError> {
    let todo = store
        .get_todo(id)?
        .ok_or_else(|| OpError::NotFound(format!("todo {}", id)))?;
    let patch = TodoPatch {
        completed: Some(!todo.completed),
        ..Default::default()
    };
    apply_update(store, id, patch)
}

/// Replace a todo's fields with those parsed from an edited line.
///
/// The id and creation date are kept. A line without a completion date
/// leaves the stored one to the usual completion coupling.
pub fn apply_text_edit<S: Store + ?Sized>(
    store: &mut S,
    id: &str,
    line: &str,
) -> Result<Todo, OpError> {
    let parsed = parse_line(line);
    let patch = TodoPatch {
        description: Some(parsed.description),
        completed: Some(parsed.completed),
        completion_date: match parsed.completion_date {
            Some(date) => Patch::Set(date),
            None => Patch::Unchanged,
        },
        priority: Patch::from_option(parsed.priority),
        due_date: Patch::Unchanged,
        project_name: Patch::from_option(parsed.project_name),
        area_name: Patch::from_option(parsed.area_name),
        metadata: Some(parsed.metadata),
        raw_text: None,
    };
    apply_update(store, id, patch)
}

// ---------------------------------------------------------------------------
// Delete / lookup
// ---------------------------------------------------------------------------

/// Delete a todo. A missing id is not an error; returns whether a row went away.
pub fn delete_todo<S: Store + ?Sized>(store: &mut S, id: &str) -> Result<bool, OpError> {
    let removed = store.delete_todo(id)?;
    if removed {
        tracing::debug!(id, "deleted todo");
    } else {
        tracing::warn!(id, "delete of missing todo ignored");
    }
    Ok(removed)
}

/// Find a todo by full id or by a unique id prefix.
pub fn find_by_id_prefix<S: Store + ?Sized>(store: &S, prefix: &str) -> Result<Todo, OpError> {
    if let Some(todo) = store.get_todo(prefix)? {
        return Ok(todo);
    }
    let mut matches = if prefix.is_empty() {
        Vec::new()
    } else {
        store.find_todos(&|t: &Todo| t.id.starts_with(prefix))?
    };
    match matches.len() {
        0 => Err(OpError::NotFound(format!("todo {}", prefix))),
        1 => Ok(matches.remove(0)),
        n => Err(OpError::Validation(format!(
            "id prefix {} is ambiguous ({} matches)",
            prefix, n
        ))),
    }
}

/// Collapse whitespace in a description and make sure it survives a round
/// trip through a line: it must keep at least one word, and no word may read
/// back as a project, area, or annotation.
fn check_description(text: &str) -> Result<String, OpError> {
    let description = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let words = strip_tokens(&description);
    if words.is_empty() {
        return Err(OpError::Validation("description cannot be empty".into()));
    }
    if words != description {
        return Err(OpError::Validation(format!(
            "description \"{}\" contains +project, @area, or key:value tokens",
            description
        )));
    }
    Ok(description)
}

fn due_from_metadata(metadata: &Metadata) -> Option<DateTime<Utc>> {
    metadata
        .get(DUE_KEY)
        .and_then(MetaValue::as_str)
        .and_then(parse_date_token)
}

fn set_due(todo: &mut Todo, due: Option<DateTime<Utc>>) {
    match due {
        Some(date) => {
            todo.metadata
                .insert(DUE_KEY.to_string(), MetaValue::from(format_date(&date)));
        }
        None => {
            todo.metadata.shift_remove(DUE_KEY);
        }
    }
    todo.due_date = due;
}
