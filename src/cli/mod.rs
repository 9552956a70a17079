//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `migrate` - Database migrations
//! - `users` - User CRUD against the configured database

pub mod args;

pub use args::{Cli, Commands};
