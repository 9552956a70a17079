//! Domain layer - Core entities
//!
//! This module contains the in-memory representation of persisted rows,
//! independent of how the store encodes them.

pub mod user;

pub use user::User;
