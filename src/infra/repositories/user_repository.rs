//! User repository implementation over raw, parameterized statements.
//!
//! Every operation is a single statement except `update`, which writes and
//! then reads back the refreshed `updated_at`. Nothing is cached between calls.

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr, FromQueryResult, Statement, Value,
};

use super::entities::{CountRow, GeneratedColumns, UpdatedAtRow, UserRow};
use crate::domain::User;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const INSERT_USER: &str = "INSERT INTO users (username, email, first_name, last_name, created_at, updated_at)
VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
RETURNING id, created_at, updated_at";

const SELECT_BY_ID: &str = "SELECT id, username, email, first_name, last_name, created_at, updated_at
FROM users WHERE id = $1";

const SELECT_BY_USERNAME: &str = "SELECT id, username, email, first_name, last_name, created_at, updated_at
FROM users WHERE username = $1";

const SELECT_BY_EMAIL: &str = "SELECT id, username, email, first_name, last_name, created_at, updated_at
FROM users WHERE email = $1";

const SELECT_ALL: &str = "SELECT id, username, email, first_name, last_name, created_at, updated_at
FROM users ORDER BY id";

const UPDATE_USER: &str = "UPDATE users
SET username = $1, email = $2, first_name = $3, last_name = $4, updated_at = CURRENT_TIMESTAMP
WHERE id = $5";

const SELECT_UPDATED_AT: &str = "SELECT updated_at FROM users WHERE id = $1";

const DELETE_BY_ID: &str = "DELETE FROM users WHERE id = $1";

const DELETE_ALL: &str = "DELETE FROM users";

const COUNT_ALL: &str = "SELECT COUNT(*) AS count FROM users";

/// User repository trait for dependency injection.
///
/// Point lookups return `Ok(None)` when no row matches; only `update` and
/// `delete` treat a missing row as `AppError::NotFound`.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and return it with the generated id and timestamps
    async fn create(&self, user: User) -> AppResult<User>;

    /// Find user by ID
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;

    /// Find user by username
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Persist mutated fields and refresh `updated_at` on the passed entity
    async fn update(&self, user: &mut User) -> AppResult<()>;

    /// Delete user by ID
    async fn delete(&self, id: i32) -> AppResult<()>;

    /// List all users ordered by ID ascending
    async fn find_all(&self) -> AppResult<Vec<User>>;

    /// Count all users
    async fn count(&self) -> AppResult<u64>;

    /// Delete every user (test/reset use only)
    async fn delete_all(&self) -> AppResult<()>;
}

/// Concrete implementation of UserRepository backed by Postgres
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance over an open connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Check store connectivity
    pub async fn ping(&self) -> AppResult<()> {
        self.db
            .execute(Statement::from_string(DatabaseBackend::Postgres, "SELECT 1"))
            .await
            .map_err(|e| AppError::store("ping", e))?;
        Ok(())
    }

    /// Close the underlying connection
    pub async fn close(self) -> AppResult<()> {
        self.db.close().await.map_err(|e| AppError::store("close", e))
    }

    #[cfg(test)]
    fn into_connection(self) -> DatabaseConnection {
        self.db
    }

    async fn find_one(
        &self,
        operation: &'static str,
        sql: &str,
        key: Value,
    ) -> AppResult<Option<User>> {
        tracing::debug!(operation, "Looking up user");

        let row = UserRow::find_by_statement(statement(sql, [key]))
            .one(&self.db)
            .await
            .map_err(|e| AppError::store(operation, e))?;

        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn create(&self, mut user: User) -> AppResult<User> {
        tracing::debug!(username = %user.username, "Creating user");

        let generated = GeneratedColumns::find_by_statement(statement(
            INSERT_USER,
            [
                user.username.clone().into(),
                user.email.clone().into(),
                nullable(&user.first_name),
                nullable(&user.last_name),
            ],
        ))
        .one(&self.db)
        .await
        .map_err(|e| AppError::from_insert("create", e))?
        .ok_or_else(|| AppError::store("create", DbErr::RecordNotInserted))?;

        generated.apply_to(&mut user);
        tracing::debug!(id = user.id, "User created");

        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        self.find_one("find_by_id", SELECT_BY_ID, id.into()).await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.find_one("find_by_username", SELECT_BY_USERNAME, username.into())
            .await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_one("find_by_email", SELECT_BY_EMAIL, email.into())
            .await
    }

    async fn update(&self, user: &mut User) -> AppResult<()> {
        tracing::debug!(id = user.id, "Updating user");

        let result = self
            .db
            .execute(statement(
                UPDATE_USER,
                [
                    user.username.clone().into(),
                    user.email.clone().into(),
                    nullable(&user.first_name),
                    nullable(&user.last_name),
                    user.id.into(),
                ],
            ))
            .await
            .map_err(|e| AppError::store("update", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(user.id));
        }

        // Not atomic with the write; a concurrent delete shows up as NotFound
        let refreshed = UpdatedAtRow::find_by_statement(statement(SELECT_UPDATED_AT, [user.id.into()]))
            .one(&self.db)
            .await
            .map_err(|e| AppError::store("update", e))?
            .ok_or_else(|| AppError::not_found(user.id))?;

        user.updated_at = refreshed.updated_at;
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        tracing::debug!(id, "Deleting user");

        let result = self
            .db
            .execute(statement(DELETE_BY_ID, [id.into()]))
            .await
            .map_err(|e| AppError::store("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(id));
        }

        Ok(())
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let rows = UserRow::find_by_statement(Statement::from_string(
            DatabaseBackend::Postgres,
            SELECT_ALL,
        ))
        .all(&self.db)
        .await
        .map_err(|e| AppError::store("find_all", e))?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn count(&self) -> AppResult<u64> {
        let row = CountRow::find_by_statement(Statement::from_string(
            DatabaseBackend::Postgres,
            COUNT_ALL,
        ))
        .one(&self.db)
        .await
        .map_err(|e| AppError::store("count", e))?
        .ok_or_else(|| {
            AppError::store("count", DbErr::RecordNotFound("COUNT(*) returned no row".into()))
        })?;

        u64::try_from(row.count).map_err(|_| {
            AppError::store("count", DbErr::Type(format!("negative count {}", row.count)))
        })
    }

    async fn delete_all(&self) -> AppResult<()> {
        let result = self
            .db
            .execute(Statement::from_string(DatabaseBackend::Postgres, DELETE_ALL))
            .await
            .map_err(|e| AppError::store("delete_all", e))?;

        tracing::debug!(rows = result.rows_affected(), "Deleted all users");
        Ok(())
    }
}

fn statement<I>(sql: &str, values: I) -> Statement
where
    I: IntoIterator<Item = Value>,
{
    Statement::from_sql_and_values(DatabaseBackend::Postgres, sql, values)
}

/// Empty name parts are stored as NULL
fn nullable(value: &str) -> Value {
    if value.is_empty() {
        Option::<String>::None.into()
    } else {
        value.to_string().into()
    }
}
