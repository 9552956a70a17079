//! User persistence - a single-entity data-access layer.
//!
//! Models a `User` record and exposes create/read/update/delete operations
//! against Postgres through parameterized statements.
//!
//! # Architecture Layers
//!
//! - **domain**: The `User` entity
//! - **infra**: Database connection, migrations and the `UserRepository`
//! - **errors**: Error taxonomy shared by the repository and CLI
//! - **config**: Settings loaded from the environment
//! - **cli** / **commands**: Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use user_persistence::{Config, Database, User, UserRepository, UserStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect(&Config::from_env()).await?;
//! let repo = UserStore::new(db.into_connection());
//!
//! let alice = repo.create(User::new("alice", "alice@example.com")).await?;
//! assert!(repo.find_by_id(alice.id).await?.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! cargo run -- migrate up
//! cargo run -- users create alice alice@example.com --first-name Alice
//! cargo run -- users list
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;

// Re-export commonly used types at crate root
pub use config::Config;
pub use domain::User;
pub use errors::{AppError, AppResult};
pub use infra::{Database, UserRepository, UserStore};
