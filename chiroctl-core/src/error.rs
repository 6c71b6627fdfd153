/// Structured error types for chiroctl-core.
///
/// Use-cases return `CoreError`; the HTTP layer maps each variant to a
/// status code and the binary wraps it in `anyhow`.
use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{Gender, ValidationError};
use crate::repository::RepoError;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Input failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    /// Natural key or business rule collides with existing data
    #[error("conflict: {reason}")]
    Conflict { reason: String },

    /// Row is still referenced and cannot be deleted
    #[error("{resource} is still in use: {reason}")]
    InUse { resource: &'static str, reason: String },

    #[error("no work-year covers {date}")]
    NoCurrentWorkYear { date: NaiveDate },

    #[error("no work-year covers the event date {date}")]
    NoWorkYearForDate { date: NaiveDate },

    #[error("no active group accepts age {age} ({gender})")]
    NoMatchingGroup { age: i32, gender: Gender },

    /// Storage failure
    #[error(transparent)]
    Repo(RepoError),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    pub fn in_use(resource: &'static str, reason: impl Into<String>) -> Self {
        Self::InUse {
            resource,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable kind, used as the `error` field of API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::InUse { .. } => "in_use",
            Self::NoCurrentWorkYear { .. } => "no_current_work_year",
            Self::NoWorkYearForDate { .. } => "no_work_year_for_date",
            Self::NoMatchingGroup { .. } => "no_matching_group",
            Self::Repo(_) => "internal_error",
        }
    }
}

impl From<RepoError> for CoreError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { resource, id } => Self::NotFound { resource, id },
            RepoError::UniqueViolation { constraint } => Self::Conflict {
                reason: format!("duplicate value for {constraint}"),
            },
            RepoError::ForeignKeyViolation { constraint } => Self::InUse {
                resource: "record",
                reason: constraint,
            },
            other => Self::Repo(other),
        }
    }
}

/// Errors loading or writing `config.toml`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config {path:?}: {source}")]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in {path:?}: {source}")]
    Parse {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown time zone '{0}'")]
    InvalidTimezone(String),

    #[error("config already exists at {0:?} (use --force to overwrite)")]
    AlreadyExists(std::path::PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_errors_map_to_core_kinds() {
        let err: CoreError = RepoError::unique("groups_name_key").into();
        assert_eq!(err.kind(), "conflict");

        let err: CoreError = RepoError::foreign_key("group_referenced").into();
        assert_eq!(err.kind(), "in_use");

        let err: CoreError = RepoError::not_found("member", "abc").into();
        assert!(matches!(err, CoreError::NotFound { resource: "member", .. }));

        let err: CoreError = RepoError::backend("connection reset").into();
        assert_eq!(err.kind(), "internal_error");
    }

    #[test]
    fn validation_message_is_passed_through() {
        let err: CoreError = ValidationError::Empty { field: "name" }.into();
        assert_eq!(err.to_string(), ValidationError::Empty { field: "name" }.to_string());
    }
}
