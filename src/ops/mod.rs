pub mod filter;
pub mod lookup_ops;
pub mod suggest;
pub mod todo_ops;

use crate::io::store::StoreError;

/// Error type for todo, project, and area operations
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    /// Bad input: empty description, blank name
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Name collides with an existing record
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A patch value for one field of a record
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    /// Leave the field as it is
    #[default]
    Unchanged,
    Set(T),
    /// Clear the field to absent
    Clear,
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Patch::Unchanged)
    }

    /// Apply to an optional field
    pub fn apply_to(self, field: &mut Option<T>) {
        match self {
            Patch::Unchanged => {}
            Patch::Set(value) => *field = Some(value),
            Patch::Clear => *field = None,
        }
    }

    /// `Set` for `Some`, `Clear` for `None`
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Set(v),
            None => Patch::Clear,
        }
    }
}
