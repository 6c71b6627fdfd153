use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use chiroctl_core::domain::{Membership, NewMembership, PaymentMethod, PaymentState};
use chiroctl_core::repository::{constraints, MembershipRepository, RepoError, RepoResult};

use super::{db_err, decode_opt};
use crate::db::PgUnitOfWork;

#[derive(Debug, FromRow)]
struct MembershipRow {
    id: Uuid,
    member_id: Uuid,
    work_year_id: Uuid,
    group_id: Uuid,
    paid: bool,
    paid_on: Option<NaiveDate>,
    payment_method: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = RepoError;

    fn try_from(row: MembershipRow) -> RepoResult<Self> {
        Ok(Self {
            id: row.id,
            member_id: row.member_id,
            work_year_id: row.work_year_id,
            group_id: row.group_id,
            paid: row.paid,
            paid_on: row.paid_on,
            payment_method: decode_opt::<PaymentMethod>(row.payment_method.as_deref())?,
            created_at: row.created_at,
        })
    }
}

const COLUMNS: &str =
    "id, member_id, work_year_id, group_id, paid, paid_on, payment_method, created_at";

#[async_trait]
impl MembershipRepository for PgUnitOfWork {
    async fn find_membership(
        &mut self,
        member_id: Uuid,
        work_year_id: Uuid,
    ) -> RepoResult<Option<Membership>> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM memberships WHERE member_id = $1 AND work_year_id = $2"
        ))
        .bind(member_id)
        .bind(work_year_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.map(Membership::try_from).transpose()
    }

    async fn insert_membership(&mut self, membership: &NewMembership) -> RepoResult<Membership> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO memberships (member_id, work_year_id, group_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (member_id, work_year_id) DO NOTHING
            RETURNING {COLUMNS}
            "#
        ))
        .bind(membership.member_id)
        .bind(membership.work_year_id)
        .bind(membership.group_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| RepoError::unique(constraints::MEMBERSHIP_PER_YEAR))?
            .try_into()
    }

    async fn get_membership(&mut self, id: Uuid) -> RepoResult<Option<Membership>> {
        let row: Option<MembershipRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM memberships WHERE id = $1"))
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(db_err)?;

        row.map(Membership::try_from).transpose()
    }

    async fn set_membership_group(&mut self, id: Uuid, group_id: Uuid) -> RepoResult<Membership> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "UPDATE memberships SET group_id = $2 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(group_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| RepoError::not_found("membership", id))?
            .try_into()
    }

    async fn set_payment(&mut self, id: Uuid, payment: PaymentState) -> RepoResult<Membership> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            r#"
            UPDATE memberships SET paid = $2, paid_on = $3, payment_method = $4
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payment.paid)
        .bind(payment.paid_on)
        .bind(payment.payment_method.map(|m| m.as_str()))
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| RepoError::not_found("membership", id))?
            .try_into()
    }

    async fn memberships_of(&mut self, member_id: Uuid) -> RepoResult<Vec<Membership>> {
        let rows: Vec<MembershipRow> = sqlx::query_as(
            r#"
            SELECT m.id, m.member_id, m.work_year_id, m.group_id, m.paid, m.paid_on,
                   m.payment_method, m.created_at
            FROM memberships m
            JOIN work_years wy ON wy.id = m.work_year_id
            WHERE m.member_id = $1
            ORDER BY wy.start_date DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Membership::try_from).collect()
    }

    async fn delete_memberships_of(&mut self, member_id: Uuid) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM memberships WHERE member_id = $1")
            .bind(member_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }
}
