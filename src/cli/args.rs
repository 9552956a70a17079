//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Args, Parser, Subcommand};

/// User persistence - CRUD over the users table
#[derive(Parser, Debug)]
#[command(name = "user-persistence")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run database migrations
    Migrate(MigrateArgs),

    /// Manage users
    Users(UsersArgs),
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

/// Arguments for the users command
#[derive(Parser, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub action: UsersAction,
}

/// User actions
#[derive(Subcommand, Debug)]
pub enum UsersAction {
    /// Create a user
    Create {
        username: String,
        email: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Show a user by ID
    Get { id: i32 },
    /// Look a user up by username or email
    Find(FindArgs),
    /// List all users ordered by ID
    List,
    /// Count users
    Count,
    /// Change fields of an existing user
    Update {
        id: i32,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Delete a user by ID
    Delete { id: i32 },
    /// Delete every user
    Purge {
        /// Confirm deleting all rows
        #[arg(long)]
        yes: bool,
    },
}

/// Lookup key for `users find`
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct FindArgs {
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
}
