//! chiroctl-server: PostgreSQL persistence and the JSON API
//!
//! `db` implements the core repository traits on top of sqlx transactions;
//! `http` exposes the use-cases through axum.

pub mod db;
pub mod http;

pub use db::{create_pool, PgStore, PoolSettings};
pub use http::{build_router, run_server, AppState, ServerConfig};
