use std::fmt;

use serde::{Deserialize, Serialize};

/// The two named entities a todo can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupKind {
    Project,
    Area,
}

impl LookupKind {
    /// Token prefix in a todo line
    pub fn sigil(self) -> char {
        match self {
            LookupKind::Project => '+',
            LookupKind::Area => '@',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LookupKind::Project => "project",
            LookupKind::Area => "area",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A project or area record. The name is the primary key; todos reference
/// it by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookup {
    pub name: String,
}

impl Lookup {
    pub fn new(name: impl Into<String>) -> Self {
        Lookup { name: name.into() }
    }
}
