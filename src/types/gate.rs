use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named pass/fail rule a password is checked against.
///
/// The pattern is a regular expression that must match the entire password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGate {
    pub id: String,
    pub pattern: String,
    pub description: String,
    pub enabled: bool,
    /// Built-in gates are not editable.
    pub editable: bool,
    pub author: Option<String>,
}

impl QualityGate {
    /// Creates an enabled, user-defined gate with a generated ID.
    pub fn custom(pattern: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: format!("custom.{}", Uuid::new_v4()),
            pattern: pattern.into(),
            description: description.into(),
            enabled: true,
            editable: true,
            author: None,
        }
    }

    pub(crate) fn builtin(id: &str, pattern: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            pattern: pattern.to_string(),
            description: description.to_string(),
            enabled: true,
            editable: false,
            author: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}
