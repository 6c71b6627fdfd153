//! Connection pool for the chapter database

use std::time::Duration;

use chiroctl_core::config::{DatabaseSection, DEFAULT_MAX_CONNECTIONS};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// How long a request waits for a free connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool sizing, normally taken from the `[database]` config section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: ACQUIRE_TIMEOUT,
        }
    }
}

impl From<&DatabaseSection> for PoolSettings {
    fn from(section: &DatabaseSection) -> Self {
        Self {
            // zero would make every unit of work wait forever
            max_connections: section.max_connections.max(1),
            ..Self::default()
        }
    }
}

/// Open a pool with the default settings.
///
/// ```ignore
/// let store = PgStore::new(create_pool("postgres://localhost/chiroctl").await?);
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    connect(database_url, PoolSettings::default()).await
}

pub async fn connect(database_url: &str, settings: PoolSettings) -> Result<PgPool, sqlx::Error> {
    tracing::debug!(
        max_connections = settings.max_connections,
        "connecting to PostgreSQL"
    );
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(database_url)
        .await
}
