use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BIND: &str = "127.0.0.1:3030";
pub const DEFAULT_TIMEZONE: &str = "Europe/Brussels";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration for the chiroctl server and CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChiroConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub organization: OrganizationSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    pub cors_permissive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationSection {
    pub name: String,
    /// IANA zone used to decide what "today" is
    pub timezone: String,
}

impl Default for OrganizationSection {
    fn default() -> Self {
        Self {
            name: "Chiro".to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl ChiroConfig {
    /// Load from `config_path()`, falling back to defaults when the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env();
        Ok(config)
    }

    /// Load a specific file without applying environment overrides
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(?path, "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.timezone()?;
        Ok(config)
    }

    /// `$CHIROCTL_CONFIG`, else `~/.chiroctl/config.toml`
    pub fn config_path() -> PathBuf {
        if let Some(path) = env::var_os("CHIROCTL_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chiroctl/config.toml")
    }

    /// `DATABASE_URL` wins over the file
    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                self.database.url = Some(url);
            }
        }
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.organization
            .timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.organization.timezone.clone()))
    }

    /// Current date in the organization's time zone
    pub fn today(&self) -> Result<NaiveDate, ConfigError> {
        Ok(Utc::now().with_timezone(&self.timezone()?).date_naive())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the default config to `path`, creating parent directories.
    pub fn write_default(path: &Path, force: bool) -> Result<(), ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, Self::default().to_toml_string()?).map_err(write_err)
    }
}
