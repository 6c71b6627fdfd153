//! chiroctl-core: membership administration for a youth chapter
//!
//! Members, parents, groups, work-years, events and sponsors, with the
//! repository interfaces and the use-cases that tie them together. Storage
//! backends live outside this crate except for the in-memory store.

pub mod config;
pub mod domain;
pub mod error;
pub mod pagination;
pub mod repository;
pub mod usecases;

pub use config::ChiroConfig;
pub use error::{ConfigError, CoreError, Result};
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use repository::{MemoryStore, RepoError, RepoResult, Store, UnitOfWork};
