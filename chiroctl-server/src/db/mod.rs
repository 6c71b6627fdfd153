//! Database layer - connection pool, schema and the PostgreSQL store
//!
//! - Connection pool (max 5 connections by default)
//! - One transaction per unit of work
//! - Natural-key inserts use ON CONFLICT DO NOTHING so a duplicate never
//!   aborts the surrounding transaction

pub mod migrations;
pub mod pool;
pub mod repos;
pub mod store;

pub use pool::{connect, create_pool, PoolSettings};
pub use sqlx::PgPool;
pub use store::{PgStore, PgUnitOfWork};
