use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::FromRow;
use uuid::Uuid;

use chiroctl_core::domain::{NewWorkYear, WorkYear};
use chiroctl_core::repository::{RepoError, RepoResult, WorkYearRepository, WorkYearUsage};

use super::{amount, db_err};
use crate::db::PgUnitOfWork;

#[derive(Debug, FromRow)]
struct WorkYearRow {
    id: Uuid,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    membership_fee_cents: i64,
}

impl TryFrom<WorkYearRow> for WorkYear {
    type Error = RepoError;

    fn try_from(row: WorkYearRow) -> RepoResult<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            membership_fee: amount(row.membership_fee_cents)?,
        })
    }
}

const COLUMNS: &str = "id, name, start_date, end_date, membership_fee_cents";

#[async_trait]
impl WorkYearRepository for PgUnitOfWork {
    async fn insert_work_year(&mut self, work_year: &NewWorkYear) -> RepoResult<WorkYear> {
        let row: WorkYearRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO work_years (name, start_date, end_date, membership_fee_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&work_year.name)
        .bind(work_year.start_date)
        .bind(work_year.end_date)
        .bind(work_year.membership_fee.cents())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.try_into()
    }

    async fn update_work_year(
        &mut self,
        id: Uuid,
        work_year: &NewWorkYear,
    ) -> RepoResult<WorkYear> {
        let row: Option<WorkYearRow> = sqlx::query_as(&format!(
            r#"
            UPDATE work_years
            SET name = $2, start_date = $3, end_date = $4, membership_fee_cents = $5
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&work_year.name)
        .bind(work_year.start_date)
        .bind(work_year.end_date)
        .bind(work_year.membership_fee.cents())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| RepoError::not_found("work-year", id))?
            .try_into()
    }

    async fn get_work_year(&mut self, id: Uuid) -> RepoResult<Option<WorkYear>> {
        let row: Option<WorkYearRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM work_years WHERE id = $1"))
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(db_err)?;

        row.map(WorkYear::try_from).transpose()
    }

    async fn list_work_years(&mut self) -> RepoResult<Vec<WorkYear>> {
        let rows: Vec<WorkYearRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM work_years ORDER BY start_date DESC"
        ))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(WorkYear::try_from).collect()
    }

    async fn work_year_containing(&mut self, date: NaiveDate) -> RepoResult<Option<WorkYear>> {
        let row: Option<WorkYearRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS} FROM work_years
            WHERE start_date <= $1 AND $1 <= end_date
            ORDER BY start_date DESC
            LIMIT 1
            "#
        ))
        .bind(date)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.map(WorkYear::try_from).transpose()
    }

    async fn overlapping_work_years(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<WorkYear>> {
        let rows: Vec<WorkYearRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS} FROM work_years
            WHERE start_date <= $2 AND $1 <= end_date
            ORDER BY start_date
            "#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(WorkYear::try_from).collect()
    }

    async fn work_year_usage(&mut self, id: Uuid) -> RepoResult<WorkYearUsage> {
        let (memberships, events, agreements): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM memberships WHERE work_year_id = $1),
                (SELECT COUNT(*) FROM events WHERE work_year_id = $1),
                (SELECT COUNT(*) FROM sponsorship_agreements WHERE work_year_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(WorkYearUsage {
            memberships,
            events,
            agreements,
        })
    }

    async fn delete_work_year(&mut self, id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM work_years WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
