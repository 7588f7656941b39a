//! Database layer - connection pool, schema, and repositories
//!
//! # Design Principles
//!
//! - Pool owned by `AppState`, no global handle
//! - Every write runs in one transaction; dropping it rolls back
//! - Composite reads use JOINs - no N+1 queries
//! - Preconditions are checked inside the transaction, and constraint
//!   violations that still slip through are mapped to conflicts

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repos;

pub use error::{is_busy, is_unique_violation, DbError};
pub use pool::{create_memory_pool, create_pool, create_pool_with_options};
pub use repos::*;
