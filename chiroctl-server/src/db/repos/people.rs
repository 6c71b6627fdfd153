//! Persons, members, parents and the links between them

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use chiroctl_core::domain::{
    EmailAddress, Member, MemberFilter, MemberSummary, NewMember, NewPerson, Parent,
    ParentRelation, Person,
};
use chiroctl_core::pagination::{Paginated, Pagination};
use chiroctl_core::repository::{
    constraints, MemberRepository, ParentRepository, PersonRepository, RepoError, RepoResult,
};

use super::{db_err, decode};
use crate::db::PgUnitOfWork;

#[derive(Debug, FromRow)]
struct PersonRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    address_id: Option<Uuid>,
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            address_id: row.address_id,
        }
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    id: Uuid,
    person_id: Uuid,
    gender: String,
    birth_date: NaiveDate,
    photo_permission: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for Member {
    type Error = RepoError;

    fn try_from(row: MemberRow) -> RepoResult<Self> {
        Ok(Self {
            id: row.id,
            person_id: row.person_id,
            gender: decode(&row.gender)?,
            birth_date: row.birth_date,
            photo_permission: row.photo_permission,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ParentRow {
    id: Uuid,
    person_id: Uuid,
    email: String,
    relation: String,
}

impl TryFrom<ParentRow> for Parent {
    type Error = RepoError;

    fn try_from(row: ParentRow) -> RepoResult<Self> {
        Ok(Self {
            id: row.id,
            person_id: row.person_id,
            email: row.email,
            relation: decode(&row.relation)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    member_id: Uuid,
    first_name: String,
    last_name: String,
    gender: String,
    birth_date: NaiveDate,
    membership_id: Option<Uuid>,
    group_id: Option<Uuid>,
    group_name: Option<String>,
    paid: Option<bool>,
    total: i64,
}

const MEMBER_COLUMNS: &str = "id, person_id, gender, birth_date, photo_permission, created_at";

#[async_trait]
impl PersonRepository for PgUnitOfWork {
    async fn insert_person(&mut self, person: &NewPerson) -> RepoResult<Person> {
        let row: PersonRow = sqlx::query_as(
            r#"
            INSERT INTO persons (first_name, last_name, email, phone, address_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, email, phone, address_id
            "#,
        )
        .bind(person.first_name.as_str())
        .bind(person.last_name.as_str())
        .bind(person.email.as_ref().map(|e| e.as_str()))
        .bind(person.phone.as_ref().map(|p| p.as_str()))
        .bind(person.address_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    async fn update_person(&mut self, id: Uuid, person: &NewPerson) -> RepoResult<Person> {
        let row: Option<PersonRow> = sqlx::query_as(
            r#"
            UPDATE persons
            SET first_name = $2, last_name = $3, email = $4, phone = $5, address_id = $6
            WHERE id = $1
            RETURNING id, first_name, last_name, email, phone, address_id
            "#,
        )
        .bind(id)
        .bind(person.first_name.as_str())
        .bind(person.last_name.as_str())
        .bind(person.email.as_ref().map(|e| e.as_str()))
        .bind(person.phone.as_ref().map(|p| p.as_str()))
        .bind(person.address_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.map(Person::from)
            .ok_or_else(|| RepoError::not_found("person", id))
    }

    async fn get_person(&mut self, id: Uuid) -> RepoResult<Option<Person>> {
        let row: Option<PersonRow> = sqlx::query_as(
            "SELECT id, first_name, last_name, email, phone, address_id FROM persons WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(row.map(Person::from))
    }

    async fn delete_person(&mut self, id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM persons WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl MemberRepository for PgUnitOfWork {
    async fn find_member_by_identity(
        &mut self,
        first_name: &str,
        last_name: &str,
        birth_date: NaiveDate,
    ) -> RepoResult<Option<Member>> {
        // Lock the identity until the transaction ends, so a concurrent
        // registration of the same child waits and then finds this member.
        sqlx::query(
            "SELECT pg_advisory_xact_lock(hashtextextended(lower($1) || '|' || lower($2) || '|' || $3::text, 0))",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(birth_date)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;

        let row: Option<MemberRow> = sqlx::query_as(
            r#"
            SELECT m.id, m.person_id, m.gender, m.birth_date, m.photo_permission, m.created_at
            FROM members m
            JOIN persons p ON p.id = m.person_id
            WHERE lower(p.first_name) = lower($1)
              AND lower(p.last_name) = lower($2)
              AND m.birth_date = $3
            ORDER BY m.created_at
            LIMIT 1
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(birth_date)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.map(Member::try_from).transpose()
    }

    async fn insert_member(&mut self, member: &NewMember) -> RepoResult<Member> {
        let row: Option<MemberRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO members (person_id, gender, birth_date, photo_permission)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (person_id) DO NOTHING
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(member.person_id)
        .bind(member.gender.as_str())
        .bind(member.birth_date)
        .bind(member.photo_permission)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| RepoError::unique(constraints::MEMBER_PERSON))?
            .try_into()
    }

    async fn update_member(&mut self, id: Uuid, member: &NewMember) -> RepoResult<Member> {
        let row: Option<MemberRow> = sqlx::query_as(&format!(
            r#"
            UPDATE members
            SET gender = $2, birth_date = $3, photo_permission = $4
            WHERE id = $1
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(member.gender.as_str())
        .bind(member.birth_date)
        .bind(member.photo_permission)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| RepoError::not_found("member", id))?
            .try_into()
    }

    async fn get_member(&mut self, id: Uuid) -> RepoResult<Option<Member>> {
        let row: Option<MemberRow> =
            sqlx::query_as(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"))
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(db_err)?;

        row.map(Member::try_from).transpose()
    }

    /// One row per member with the newest membership that passes the filter.
    async fn list_members(
        &mut self,
        filter: MemberFilter,
        page: Pagination,
    ) -> RepoResult<Paginated<MemberSummary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(
            r#"
            SELECT
                m.id AS member_id,
                p.first_name,
                p.last_name,
                m.gender,
                m.birth_date,
                ms.id AS membership_id,
                ms.group_id,
                g.name AS group_name,
                ms.paid,
                COUNT(*) OVER() AS total
            FROM members m
            JOIN persons p ON p.id = m.person_id
            LEFT JOIN LATERAL (
                SELECT x.id, x.group_id, x.paid
                FROM memberships x
                JOIN work_years wy ON wy.id = x.work_year_id
                WHERE x.member_id = m.id
                  AND ($1::uuid IS NULL OR x.work_year_id = $1)
                  AND ($2::uuid IS NULL OR x.group_id = $2)
                ORDER BY wy.start_date DESC
                LIMIT 1
            ) ms ON TRUE
            LEFT JOIN groups g ON g.id = ms.group_id
            WHERE ($1::uuid IS NULL AND $2::uuid IS NULL) OR ms.id IS NOT NULL
            ORDER BY lower(p.last_name), lower(p.first_name), m.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.work_year_id)
        .bind(filter.group_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;

        let total = rows.first().map(|r| r.total).unwrap_or(0);
        let items = rows
            .into_iter()
            .map(|r| {
                Ok(MemberSummary {
                    member_id: r.member_id,
                    first_name: r.first_name,
                    last_name: r.last_name,
                    gender: decode(&r.gender)?,
                    birth_date: r.birth_date,
                    membership_id: r.membership_id,
                    group_id: r.group_id,
                    group_name: r.group_name,
                    paid: r.paid,
                })
            })
            .collect::<RepoResult<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn delete_member(&mut self, id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn link_parent(&mut self, member_id: Uuid, parent_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO member_parents (member_id, parent_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(member_id)
        .bind(parent_id)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn unlink_parents(&mut self, member_id: Uuid) -> RepoResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("DELETE FROM member_parents WHERE member_id = $1 RETURNING parent_id")
                .bind(member_id)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(db_err)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn parents_of(&mut self, member_id: Uuid) -> RepoResult<Vec<Parent>> {
        let rows: Vec<ParentRow> = sqlx::query_as(
            r#"
            SELECT pa.id, pa.person_id, pa.email, pa.relation
            FROM member_parents mp
            JOIN parents pa ON pa.id = mp.parent_id
            WHERE mp.member_id = $1
            ORDER BY pa.id
            "#,
        )
        .bind(member_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Parent::try_from).collect()
    }

    async fn parent_link_count(&mut self, parent_id: Uuid) -> RepoResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM member_parents WHERE parent_id = $1")
                .bind(parent_id)
                .fetch_one(&mut *self.tx)
                .await
                .map_err(db_err)?;
        Ok(count)
    }
}

#[async_trait]
impl ParentRepository for PgUnitOfWork {
    async fn find_parent_by_email(&mut self, email: &EmailAddress) -> RepoResult<Option<Parent>> {
        let row: Option<ParentRow> =
            sqlx::query_as("SELECT id, person_id, email, relation FROM parents WHERE email = $1")
                .bind(email.as_str())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(db_err)?;

        row.map(Parent::try_from).transpose()
    }

    async fn insert_parent(
        &mut self,
        person_id: Uuid,
        email: &EmailAddress,
        relation: ParentRelation,
    ) -> RepoResult<Parent> {
        let row: Option<ParentRow> = sqlx::query_as(
            r#"
            INSERT INTO parents (person_id, email, relation)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            RETURNING id, person_id, email, relation
            "#,
        )
        .bind(person_id)
        .bind(email.as_str())
        .bind(relation.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| RepoError::unique(constraints::PARENT_EMAIL))?
            .try_into()
    }

    async fn update_parent_relation(
        &mut self,
        id: Uuid,
        relation: ParentRelation,
    ) -> RepoResult<Parent> {
        let row: Option<ParentRow> = sqlx::query_as(
            r#"
            UPDATE parents SET relation = $2
            WHERE id = $1
            RETURNING id, person_id, email, relation
            "#,
        )
        .bind(id)
        .bind(relation.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| RepoError::not_found("parent", id))?
            .try_into()
    }

    async fn get_parent(&mut self, id: Uuid) -> RepoResult<Option<Parent>> {
        let row: Option<ParentRow> =
            sqlx::query_as("SELECT id, person_id, email, relation FROM parents WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(db_err)?;

        row.map(Parent::try_from).transpose()
    }

    async fn delete_parent(&mut self, id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM parents WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
