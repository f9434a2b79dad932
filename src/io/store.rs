use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::io::lock::LockError;
use crate::model::lookup::{Lookup, LookupKind};
use crate::model::todo::Todo;

/// Error type for record store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} \"{name}\" already exists")]
    DuplicateLookup { kind: LookupKind, name: String },
    #[error("todo {0} already exists")]
    DuplicateTodo(String),
    #[error("{0} not found in store")]
    Missing(String),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("store data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("store mutex poisoned by a panicked writer")]
    Poisoned,
}

/// Ordering for `Store::list_todos`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Newest first
    #[default]
    CreatedDesc,
    CreatedAsc,
}

/// Record store operations over todos, projects, and areas.
///
/// A `Store` value is a transaction-scoped handle: everything done through
/// one handle either commits together or not at all. Projects and areas are
/// keyed by exact name.
pub trait Store {
    fn get_todo(&self, id: &str) -> Result<Option<Todo>, StoreError>;
    fn find_todos(&self, predicate: &dyn Fn(&Todo) -> bool) -> Result<Vec<Todo>, StoreError>;
    fn insert_todo(&mut self, todo: Todo) -> Result<(), StoreError>;
    /// Replace the stored row with the same id.
    fn update_todo(&mut self, todo: Todo) -> Result<(), StoreError>;
    /// Returns whether a row was removed.
    fn delete_todo(&mut self, id: &str) -> Result<bool, StoreError>;
    fn list_todos(&self, order: ListOrder) -> Result<Vec<Todo>, StoreError>;

    fn get_lookup(&self, kind: LookupKind, name: &str) -> Result<Option<Lookup>, StoreError>;
    /// All records of `kind`, sorted by name.
    fn list_lookups(&self, kind: LookupKind) -> Result<Vec<Lookup>, StoreError>;
    /// Fails with `DuplicateLookup` if the exact name is taken.
    fn insert_lookup(&mut self, kind: LookupKind, lookup: Lookup) -> Result<(), StoreError>;
    fn rename_lookup(&mut self, kind: LookupKind, old: &str, new: &str) -> Result<(), StoreError>;
    /// Returns whether a row was removed.
    fn delete_lookup(&mut self, kind: LookupKind, name: &str) -> Result<bool, StoreError>;
}

/// In-memory tables. Also the on-disk JSON shape of `FileStore`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub projects: Vec<Lookup>,
    #[serde(default)]
    pub areas: Vec<Lookup>,
}

impl Tables {
    fn lookups(&self, kind: LookupKind) -> &Vec<Lookup> {
        match kind {
            LookupKind::Project => &self.projects,
            LookupKind::Area => &self.areas,
        }
    }

    fn lookups_mut(&mut self, kind: LookupKind) -> &mut Vec<Lookup> {
        match kind {
            LookupKind::Project => &mut self.projects,
            LookupKind::Area => &mut self.areas,
        }
    }
}

impl Store for Tables {
    fn get_todo(&self, id: &str) -> Result<Option<Todo>, StoreError> {
        Ok(self.todos.iter().find(|t| t.id == id).cloned())
    }

    fn find_todos(&self, predicate: &dyn Fn(&Todo) -> bool) -> Result<Vec<Todo>, StoreError> {
        Ok(self.todos.iter().filter(|t| predicate(t)).cloned().collect())
    }

    fn insert_todo(&mut self, todo: Todo) -> Result<(), StoreError> {
        if self.todos.iter().any(|t| t.id == todo.id) {
            return Err(StoreError::DuplicateTodo(todo.id));
        }
        self.todos.push(todo);
        Ok(())
    }

    fn update_todo(&mut self, todo: Todo) -> Result<(), StoreError> {
        let slot = self
            .todos
            .iter_mut()
            .find(|t| t.id == todo.id)
            .ok_or_else(|| StoreError::Missing(format!("todo {}", todo.id)))?;
        *slot = todo;
        Ok(())
    }

    fn delete_todo(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.todos.len();
        self.todos.retain(|t| t.id != id);
        Ok(self.todos.len() != before)
    }

    fn list_todos(&self, order: ListOrder) -> Result<Vec<Todo>, StoreError> {
        let mut todos = self.todos.clone();
        match order {
            ListOrder::CreatedDesc => todos.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ListOrder::CreatedAsc => todos.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }
        Ok(todos)
    }

    fn get_lookup(&self, kind: LookupKind, name: &str) -> Result<Option<Lookup>, StoreError> {
        Ok(self.lookups(kind).iter().find(|l| l.name == name).cloned())
    }

    fn list_lookups(&self, kind: LookupKind) -> Result<Vec<Lookup>, StoreError> {
        let mut lookups = self.lookups(kind).clone();
        lookups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lookups)
    }

    fn insert_lookup(&mut self, kind: LookupKind, lookup: Lookup) -> Result<(), StoreError> {
        let table = self.lookups_mut(kind);
        if table.iter().any(|l| l.name == lookup.name) {
            return Err(StoreError::DuplicateLookup {
                kind,
                name: lookup.name,
            });
        }
        table.push(lookup);
        Ok(())
    }

    fn rename_lookup(&mut self, kind: LookupKind, old: &str, new: &str) -> Result<(), StoreError> {
        let table = self.lookups_mut(kind);
        if old != new && table.iter().any(|l| l.name == new) {
            return Err(StoreError::DuplicateLookup {
                kind,
                name: new.to_string(),
            });
        }
        let slot = table
            .iter_mut()
            .find(|l| l.name == old)
            .ok_or_else(|| StoreError::Missing(format!("{} {}", kind, old)))?;
        slot.name = new.to_string();
        Ok(())
    }

    fn delete_lookup(&mut self, kind: LookupKind, name: &str) -> Result<bool, StoreError> {
        let table = self.lookups_mut(kind);
        let before = table.len();
        table.retain(|l| l.name != name);
        Ok(table.len() != before)
    }
}

/// A thread-safe in-memory store.
///
/// Each transaction runs against a copy of the tables and is committed only
/// when the closure returns `Ok`. The mutex serializes transactions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Tables) -> Self {
        MemoryStore {
            tables: Mutex::new(tables),
        }
    }

    /// Run `f` atomically against the store.
    pub fn transaction<T, E>(&self, f: impl FnOnce(&mut Tables) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        let mut working = guard.clone();
        let out = f(&mut working)?;
        *guard = working;
        Ok(out)
    }

    /// A copy of the current committed tables
    pub fn snapshot(&self) -> Result<Tables, StoreError> {
        let guard = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }
}
