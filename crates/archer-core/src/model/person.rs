//! People appearing as commit authors and committers.

use serde::{Deserialize, Serialize};

use super::PersonId;

/// A person, possibly known under several names and emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    /// Display name.
    pub name: String,
    /// Alternative names seen in history.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    #[serde(default)]
    pub ignore: bool,
}

impl Person {
    pub fn new(id: PersonId, name: impl Into<String>) -> Self {
        Person {
            id,
            name: name.into(),
            names: Vec::new(),
            emails: Vec::new(),
            ignore: false,
        }
    }

    /// Display name followed by every alternative name.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.names.iter().map(String::as_str))
    }
}
