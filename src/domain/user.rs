//! User domain entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User domain entity
///
/// A transient value holder: the store owns the durable row, and the
/// repository never keeps instances between calls. `id` is `0` until the
/// store assigns one on creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unsaved user with only the required fields set
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Create a new, unsaved user with identity and name fields set
    pub fn with_names(
        username: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }

    /// Display name built from whichever name parts are present.
    ///
    /// No trimming: `" "` counts as a present name part.
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => String::new(),
        }
    }

    /// Check that the required fields are set.
    ///
    /// Advisory only; the repository does not enforce it.
    pub fn is_valid(&self) -> bool {
        !self.username.is_empty() && !self.email.is_empty()
    }

    /// Check if the store has assigned an identifier
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "User(id={}, username='{}', email='{}')",
            self.id, self.username, self.email
        )
    }
}
