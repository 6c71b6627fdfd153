use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use chiroctl_core::domain::{
    EmergencyContact, MedicalInformation, NewEmergencyContact, NewMedicalInformation,
};
use chiroctl_core::repository::{CareRepository, RepoResult};

use super::db_err;
use crate::db::PgUnitOfWork;

#[derive(Debug, FromRow)]
struct EmergencyContactRow {
    id: Uuid,
    member_id: Uuid,
    name: String,
    phone: String,
    relation: String,
}

impl From<EmergencyContactRow> for EmergencyContact {
    fn from(row: EmergencyContactRow) -> Self {
        Self {
            id: row.id,
            member_id: row.member_id,
            name: row.name,
            phone: row.phone,
            relation: row.relation,
        }
    }
}

#[derive(Debug, FromRow)]
struct MedicalRow {
    id: Uuid,
    member_id: Uuid,
    doctor_name: String,
    doctor_phone: String,
    allergies: Option<String>,
    medication: Option<String>,
    diet: Option<String>,
    conditions: Option<String>,
    tetanus_vaccinated: bool,
    paracetamol_allowed: bool,
    remarks: Option<String>,
}

impl From<MedicalRow> for MedicalInformation {
    fn from(row: MedicalRow) -> Self {
        Self {
            id: row.id,
            member_id: row.member_id,
            doctor_name: row.doctor_name,
            doctor_phone: row.doctor_phone,
            allergies: row.allergies,
            medication: row.medication,
            diet: row.diet,
            conditions: row.conditions,
            tetanus_vaccinated: row.tetanus_vaccinated,
            paracetamol_allowed: row.paracetamol_allowed,
            remarks: row.remarks,
        }
    }
}

const MEDICAL_COLUMNS: &str = "id, member_id, doctor_name, doctor_phone, allergies, medication, \
     diet, conditions, tetanus_vaccinated, paracetamol_allowed, remarks";

#[async_trait]
impl CareRepository for PgUnitOfWork {
    async fn upsert_emergency_contact(
        &mut self,
        member_id: Uuid,
        contact: &NewEmergencyContact,
    ) -> RepoResult<EmergencyContact> {
        let row: EmergencyContactRow = sqlx::query_as(
            r#"
            INSERT INTO emergency_contacts (member_id, name, phone, relation)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (member_id) DO UPDATE
            SET name = EXCLUDED.name, phone = EXCLUDED.phone, relation = EXCLUDED.relation
            RETURNING id, member_id, name, phone, relation
            "#,
        )
        .bind(member_id)
        .bind(contact.name.as_str())
        .bind(contact.phone.as_str())
        .bind(&contact.relation)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    async fn emergency_contact_of(
        &mut self,
        member_id: Uuid,
    ) -> RepoResult<Option<EmergencyContact>> {
        let row: Option<EmergencyContactRow> = sqlx::query_as(
            "SELECT id, member_id, name, phone, relation FROM emergency_contacts WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(row.map(EmergencyContact::from))
    }

    async fn upsert_medical(
        &mut self,
        member_id: Uuid,
        medical: &NewMedicalInformation,
    ) -> RepoResult<MedicalInformation> {
        let row: MedicalRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO medical_information (
                member_id, doctor_name, doctor_phone, allergies, medication,
                diet, conditions, tetanus_vaccinated, paracetamol_allowed, remarks
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (member_id) DO UPDATE SET
                doctor_name = EXCLUDED.doctor_name,
                doctor_phone = EXCLUDED.doctor_phone,
                allergies = EXCLUDED.allergies,
                medication = EXCLUDED.medication,
                diet = EXCLUDED.diet,
                conditions = EXCLUDED.conditions,
                tetanus_vaccinated = EXCLUDED.tetanus_vaccinated,
                paracetamol_allowed = EXCLUDED.paracetamol_allowed,
                remarks = EXCLUDED.remarks
            RETURNING {MEDICAL_COLUMNS}
            "#
        ))
        .bind(member_id)
        .bind(medical.doctor_name.as_str())
        .bind(medical.doctor_phone.as_str())
        .bind(&medical.allergies)
        .bind(&medical.medication)
        .bind(&medical.diet)
        .bind(&medical.conditions)
        .bind(medical.tetanus_vaccinated)
        .bind(medical.paracetamol_allowed)
        .bind(&medical.remarks)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    async fn medical_of(&mut self, member_id: Uuid) -> RepoResult<Option<MedicalInformation>> {
        let row: Option<MedicalRow> = sqlx::query_as(&format!(
            "SELECT {MEDICAL_COLUMNS} FROM medical_information WHERE member_id = $1"
        ))
        .bind(member_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(row.map(MedicalInformation::from))
    }

    async fn delete_care_of(&mut self, member_id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM emergency_contacts WHERE member_id = $1")
            .bind(member_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM medical_information WHERE member_id = $1")
            .bind(member_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
