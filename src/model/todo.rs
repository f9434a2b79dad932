use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::lookup::LookupKind;

/// Todo priority. Only `A` through `D` are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    A,
    B,
    C,
    D,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::A, Priority::B, Priority::C, Priority::D];

    /// The letter used inside `(X)`
    pub fn letter(self) -> char {
        match self {
            Priority::A => 'A',
            Priority::B => 'B',
            Priority::C => 'C',
            Priority::D => 'D',
        }
    }

    /// Parse a priority letter. Lowercase is not accepted.
    pub fn from_letter(c: char) -> Option<Priority> {
        match c {
            'A' => Some(Priority::A),
            'B' => Some(Priority::B),
            'C' => Some(Priority::C),
            'D' => Some(Priority::D),
            _ => None,
        }
    }

    /// Parse the `(X)` token form
    pub fn from_token(token: &str) -> Option<Priority> {
        let inner = token.strip_prefix('(')?.strip_suffix(')')?;
        let mut chars = inner.chars();
        let c = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        Priority::from_letter(c)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A scalar metadata value from a `key:value` annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Null => write!(f, "null"),
            MetaValue::Bool(b) => write!(f, "{}", b),
            MetaValue::Number(n) => write!(f, "{}", n),
            MetaValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::String(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::String(s)
    }
}

/// Ordered `key:value` annotations
pub type Metadata = IndexMap<String, MetaValue>;

/// A single todo with its parsed fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Opaque unique id, assigned at creation
    pub id: String,
    /// The most recently typed (or canonical) text line
    pub raw_text: String,
    /// Free text with all recognized tokens stripped
    pub description: String,
    pub completed: bool,
    /// Set only while `completed` is true
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Project reference by name (`+Name`)
    #[serde(default)]
    pub project_name: Option<String>,
    /// Area reference by name (`@name`)
    #[serde(default)]
    pub area_name: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Todo {
    /// Create an incomplete todo with a fresh id, created now.
    pub fn new(description: impl Into<String>) -> Self {
        let description = description.into();
        Todo {
            id: new_id(),
            raw_text: description.clone(),
            description,
            completed: false,
            completion_date: None,
            priority: None,
            created_at: Utc::now(),
            due_date: None,
            project_name: None,
            area_name: None,
            metadata: Metadata::new(),
        }
    }

    /// The priority as shown to the user; suppressed once completed.
    pub fn display_priority(&self) -> Option<Priority> {
        if self.completed { None } else { self.priority }
    }

    /// The project or area name this todo points at
    pub fn reference(&self, kind: LookupKind) -> Option<&str> {
        match kind {
            LookupKind::Project => self.project_name.as_deref(),
            LookupKind::Area => self.area_name.as_deref(),
        }
    }

    pub fn reference_mut(&mut self, kind: LookupKind) -> &mut Option<String> {
        match kind {
            LookupKind::Project => &mut self.project_name,
            LookupKind::Area => &mut self.area_name,
        }
    }

    /// First characters of the id, for compact listings
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }
}

/// Generate a fresh opaque todo id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
