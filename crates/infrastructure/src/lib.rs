//! Radarr infrastructure module
//!
//! This module provides concrete implementations of repository traits
//! defined in the core domain layer, using PostgreSQL as the data store.

pub mod database;
pub mod error;
pub mod repositories;

// Re-export for easy access
pub use database::*;
pub use error::*;
pub use repositories::*;
