//! Repository trait implementations for `PgUnitOfWork`
//!
//! - Lists use JOINs or LATERAL subqueries (no N+1)
//! - Natural-key inserts use ON CONFLICT DO NOTHING RETURNING; no row back
//!   means the key was taken
//! - Enum columns are TEXT and decoded through the domain `FromStr` impls

mod addresses;
mod care;
mod events;
mod groups;
mod memberships;
mod people;
mod sponsors;
mod work_years;

use std::str::FromStr;

use chiroctl_core::domain::{Amount, ValidationError};
use chiroctl_core::repository::{RepoError, RepoResult};

/// Classify a sqlx error by SQLSTATE.
///
/// Exclusion violations (23P01) count as unique violations: both mean the
/// row collides with one that already exists.
pub(crate) fn db_err(err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &err {
        let constraint = db.constraint().unwrap_or_default().to_string();
        match db.code().as_deref() {
            Some("23505") | Some("23P01") => return RepoError::unique(constraint),
            Some("23503") => return RepoError::foreign_key(constraint),
            _ => {}
        }
    }
    RepoError::backend(err)
}

/// Decode a TEXT enum column.
pub(crate) fn decode<T>(value: &str) -> RepoResult<T>
where
    T: FromStr<Err = ValidationError>,
{
    value.parse().map_err(RepoError::backend)
}

pub(crate) fn decode_opt<T>(value: Option<&str>) -> RepoResult<Option<T>>
where
    T: FromStr<Err = ValidationError>,
{
    value.map(decode).transpose()
}

pub(crate) fn amount(cents: i64) -> RepoResult<Amount> {
    Amount::from_cents(cents).map_err(RepoError::backend)
}
