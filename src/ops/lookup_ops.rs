use crate::io::store::{Store, StoreError};
use crate::model::lookup::{Lookup, LookupKind};
use crate::model::todo::Todo;
use crate::ops::OpError;
use crate::parse::format_line;

/// Resolve a typed name to a project/area, creating it on first use.
///
/// Blank or missing names resolve to no reference. An existing record with
/// the exact name is returned as-is. If the insert loses a race with another
/// writer (the store reports a duplicate), the record is re-read instead of
/// failing.
pub fn resolve<S: Store + ?Sized>(
    store: &mut S,
    kind: LookupKind,
    name: Option<&str>,
) -> Result<Option<String>, OpError> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if let Some(existing) = store.get_lookup(kind, name)? {
        return Ok(Some(existing.name));
    }

    match store.insert_lookup(kind, Lookup::new(name)) {
        Ok(()) => {
            tracing::debug!(%kind, name, "created on first reference");
            Ok(Some(name.to_string()))
        }
        Err(StoreError::DuplicateLookup { .. }) => {
            tracing::debug!(%kind, name, "created concurrently, re-reading");
            let existing = store
                .get_lookup(kind, name)?
                .ok_or_else(|| StoreError::Missing(format!("{} {}", kind, name)))?;
            Ok(Some(existing.name))
        }
        Err(e) => Err(e.into()),
    }
}

/// Explicitly create a project/area. Returns the stored (trimmed) name.
pub fn add_lookup<S: Store + ?Sized>(
    store: &mut S,
    kind: LookupKind,
    name: &str,
) -> Result<String, OpError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OpError::Validation(format!("{} name cannot be empty", kind)));
    }
    if store.get_lookup(kind, name)?.is_some() {
        return Err(already_exists(kind, name));
    }
    match store.insert_lookup(kind, Lookup::new(name)) {
        Ok(()) => {
            tracing::debug!(%kind, name, "added");
            Ok(name.to_string())
        }
        Err(StoreError::DuplicateLookup { .. }) => Err(already_exists(kind, name)),
        Err(e) => Err(e.into()),
    }
}

/// Rename a project/area and repoint every todo that referenced it.
///
/// The new name is trimmed and must not be blank. It must not match any
/// other record's name case-insensitively; changing only the case of the
/// record's own name is allowed. Returns the number of todos updated.
pub fn rename_lookup<S: Store + ?Sized>(
    store: &mut S,
    kind: LookupKind,
    old_name: &str,
    new_name: &str,
) -> Result<usize, OpError> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(OpError::Validation(format!("{} name cannot be empty", kind)));
    }
    if store.get_lookup(kind, old_name)?.is_none() {
        return Err(OpError::NotFound(format!("{} \"{}\"", kind, old_name)));
    }
    if new_name == old_name {
        return Ok(0);
    }

    let folded = new_name.to_lowercase();
    let collides = store
        .list_lookups(kind)?
        .iter()
        .any(|l| l.name != old_name && l.name.to_lowercase() == folded);
    if collides {
        return Err(already_exists(kind, new_name));
    }

    store.rename_lookup(kind, old_name, new_name)?;
    let updated = repoint_references(store, kind, old_name, Some(new_name))?;
    tracing::debug!(%kind, old_name, new_name, updated, "renamed");
    Ok(updated)
}

/// Delete a project/area, detaching it from any todo that referenced it.
///
/// Deleting a name that does not exist is a no-op. Todos are never deleted.
/// Returns the number of todos detached.
pub fn delete_lookup<S: Store + ?Sized>(
    store: &mut S,
    kind: LookupKind,
    name: &str,
) -> Result<usize, OpError> {
    if !store.delete_lookup(kind, name)? {
        tracing::warn!(%kind, name, "delete of missing record ignored");
        return Ok(0);
    }
    let detached = repoint_references(store, kind, name, None)?;
    tracing::debug!(%kind, name, detached, "deleted");
    Ok(detached)
}

/// All stored names of `kind`, sorted
pub fn lookup_names<S: Store + ?Sized>(store: &S, kind: LookupKind) -> Result<Vec<String>, OpError> {
    Ok(store
        .list_lookups(kind)?
        .into_iter()
        .map(|l| l.name)
        .collect())
}

/// Point todos referencing `from` at `to` (or detach them when `to` is None),
/// refreshing their canonical text.
fn repoint_references<S: Store + ?Sized>(
    store: &mut S,
    kind: LookupKind,
    from: &str,
    to: Option<&str>,
) -> Result<usize, OpError> {
    let affected = store.find_todos(&|t: &Todo| t.reference(kind) == Some(from))?;
    let count = affected.len();
    for mut todo in affected {
        *todo.reference_mut(kind) = to.map(str::to_string);
        todo.raw_text = format_line(&todo);
        store.update_todo(todo)?;
    }
    Ok(count)
}

fn already_exists(kind: LookupKind, name: &str) -> OpError {
    OpError::Conflict(format!("{} \"{}\" already exists", kind, name))
}
