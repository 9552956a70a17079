//! Rows read back from the `users` table.

use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;

use crate::domain::User;

/// Full `users` row, as selected by every lookup.
///
/// Name columns are nullable; `NULL` maps to an empty string on the entity.
#[derive(Debug, Clone, FromQueryResult)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns the store generates on insert
#[derive(Debug, Clone, FromQueryResult)]
pub struct GeneratedColumns {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct UpdatedAtRow {
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct CountRow {
    pub count: i64,
}

/// Convert database row to domain entity
impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name.unwrap_or_default(),
            last_name: row.last_name.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl GeneratedColumns {
    /// Copy the generated values onto an entity that was just inserted
    pub fn apply_to(self, user: &mut User) {
        user.id = self.id;
        user.created_at = self.created_at;
        user.updated_at = self.updated_at;
    }
}
