use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use chiroctl_core::domain::{
    NewAgreement, NewSponsor, Sponsor, SponsorshipAgreement, SponsorshipKind,
};
use chiroctl_core::repository::{constraints, RepoError, RepoResult, SponsorRepository};

use super::{amount, db_err, decode};
use crate::db::PgUnitOfWork;

#[derive(Debug, FromRow)]
struct SponsorRow {
    id: Uuid,
    company_name: String,
    contact_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    address_id: Option<Uuid>,
}

impl From<SponsorRow> for Sponsor {
    fn from(row: SponsorRow) -> Self {
        Self {
            id: row.id,
            company_name: row.company_name,
            contact_name: row.contact_name,
            email: row.email,
            phone: row.phone,
            website: row.website,
            address_id: row.address_id,
        }
    }
}

#[derive(Debug, FromRow)]
struct AgreementRow {
    id: Uuid,
    sponsor_id: Uuid,
    work_year_id: Uuid,
    amount_cents: i64,
    kind: String,
    paid: bool,
    notes: Option<String>,
}

impl TryFrom<AgreementRow> for SponsorshipAgreement {
    type Error = RepoError;

    fn try_from(row: AgreementRow) -> RepoResult<Self> {
        Ok(Self {
            id: row.id,
            sponsor_id: row.sponsor_id,
            work_year_id: row.work_year_id,
            amount: amount(row.amount_cents)?,
            kind: decode::<SponsorshipKind>(&row.kind)?,
            paid: row.paid,
            notes: row.notes,
        })
    }
}

const SPONSOR_COLUMNS: &str = "id, company_name, contact_name, email, phone, website, address_id";
const AGREEMENT_COLUMNS: &str = "id, sponsor_id, work_year_id, amount_cents, kind, paid, notes";

#[async_trait]
impl SponsorRepository for PgUnitOfWork {
    async fn insert_sponsor(&mut self, sponsor: &NewSponsor) -> RepoResult<Sponsor> {
        let row: Option<SponsorRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO sponsors (company_name, contact_name, email, phone, website, address_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (lower(company_name)) DO NOTHING
            RETURNING {SPONSOR_COLUMNS}
            "#
        ))
        .bind(&sponsor.company_name)
        .bind(&sponsor.contact_name)
        .bind(&sponsor.email)
        .bind(&sponsor.phone)
        .bind(&sponsor.website)
        .bind(sponsor.address_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.map(Sponsor::from)
            .ok_or_else(|| RepoError::unique(constraints::SPONSOR_NAME))
    }

    async fn update_sponsor(&mut self, id: Uuid, sponsor: &NewSponsor) -> RepoResult<Sponsor> {
        let row: Option<SponsorRow> = sqlx::query_as(&format!(
            r#"
            UPDATE sponsors
            SET company_name = $2, contact_name = $3, email = $4, phone = $5,
                website = $6, address_id = $7
            WHERE id = $1
            RETURNING {SPONSOR_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&sponsor.company_name)
        .bind(&sponsor.contact_name)
        .bind(&sponsor.email)
        .bind(&sponsor.phone)
        .bind(&sponsor.website)
        .bind(sponsor.address_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.map(Sponsor::from)
            .ok_or_else(|| RepoError::not_found("sponsor", id))
    }

    async fn get_sponsor(&mut self, id: Uuid) -> RepoResult<Option<Sponsor>> {
        let row: Option<SponsorRow> = sqlx::query_as(&format!(
            "SELECT {SPONSOR_COLUMNS} FROM sponsors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(row.map(Sponsor::from))
    }

    async fn list_sponsors(&mut self) -> RepoResult<Vec<Sponsor>> {
        let rows: Vec<SponsorRow> = sqlx::query_as(&format!(
            "SELECT {SPONSOR_COLUMNS} FROM sponsors ORDER BY company_name"
        ))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Sponsor::from).collect())
    }

    async fn delete_sponsor(&mut self, id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM sponsors WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn insert_agreement(
        &mut self,
        agreement: &NewAgreement,
    ) -> RepoResult<SponsorshipAgreement> {
        let row: Option<AgreementRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO sponsorship_agreements (sponsor_id, work_year_id, amount_cents, kind, notes)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (sponsor_id, work_year_id) DO NOTHING
            RETURNING {AGREEMENT_COLUMNS}
            "#
        ))
        .bind(agreement.sponsor_id)
        .bind(agreement.work_year_id)
        .bind(agreement.amount.cents())
        .bind(agreement.kind.as_str())
        .bind(&agreement.notes)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| RepoError::unique(constraints::AGREEMENT_PER_YEAR))?
            .try_into()
    }

    async fn get_agreement(&mut self, id: Uuid) -> RepoResult<Option<SponsorshipAgreement>> {
        let row: Option<AgreementRow> = sqlx::query_as(&format!(
            "SELECT {AGREEMENT_COLUMNS} FROM sponsorship_agreements WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.map(SponsorshipAgreement::try_from).transpose()
    }

    async fn agreements_of(&mut self, sponsor_id: Uuid) -> RepoResult<Vec<SponsorshipAgreement>> {
        let rows: Vec<AgreementRow> = sqlx::query_as(
            r#"
            SELECT a.id, a.sponsor_id, a.work_year_id, a.amount_cents, a.kind, a.paid, a.notes
            FROM sponsorship_agreements a
            JOIN work_years wy ON wy.id = a.work_year_id
            WHERE a.sponsor_id = $1
            ORDER BY wy.start_date DESC
            "#,
        )
        .bind(sponsor_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(SponsorshipAgreement::try_from).collect()
    }

    async fn set_agreement_paid(
        &mut self,
        id: Uuid,
        paid: bool,
    ) -> RepoResult<SponsorshipAgreement> {
        let row: Option<AgreementRow> = sqlx::query_as(&format!(
            "UPDATE sponsorship_agreements SET paid = $2 WHERE id = $1 RETURNING {AGREEMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(paid)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| RepoError::not_found("agreement", id))?
            .try_into()
    }

    async fn delete_agreement(&mut self, id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM sponsorship_agreements WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_agreements_of(&mut self, sponsor_id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM sponsorship_agreements WHERE sponsor_id = $1")
            .bind(sponsor_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
