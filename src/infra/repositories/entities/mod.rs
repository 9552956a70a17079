//! Row types decoded from raw statements.
//!
//! These are database-specific shapes separate from domain models.

pub mod user;

pub use user::{CountRow, GeneratedColumns, UpdatedAtRow, UserRow};
