//! EAT Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbConfig`], [`DbManager`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Repository implementations for the `eat-core` traits
//!
//! Every mutating repository operation on a tracked resource runs the
//! mutation and its audit entry inside one database transaction, so a
//! failed audit write rolls the mutation back.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
