//! registrar-server: HTTP API for a student registration system
//!
//! Students and courses are addressed by natural key (national id and
//! course code). Enrollments link the two and are admitted only when the
//! student has no other course in the same schedule slot.

pub mod config;
pub mod db;
pub mod http;
pub mod models;
pub mod rules;

pub use config::{ConfigError, DatabaseConfig, ServerConfig};
pub use db::{create_memory_pool, create_pool, create_pool_with_options, DbError};
pub use http::{build_router, run_server, AppState, ServerError};
