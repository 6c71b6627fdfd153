use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use chiroctl_core::domain::{Gender, Group, NewGroup};
use chiroctl_core::repository::{constraints, GroupRepository, RepoError, RepoResult};

use super::{db_err, decode_opt};
use crate::db::PgUnitOfWork;

#[derive(Debug, FromRow)]
struct GroupRow {
    id: Uuid,
    name: String,
    min_age: i32,
    max_age: i32,
    gender: Option<String>,
    description: Option<String>,
    active: bool,
}

impl TryFrom<GroupRow> for Group {
    type Error = RepoError;

    fn try_from(row: GroupRow) -> RepoResult<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            min_age: row.min_age,
            max_age: row.max_age,
            gender: decode_opt::<Gender>(row.gender.as_deref())?,
            description: row.description,
            active: row.active,
        })
    }
}

const COLUMNS: &str = "id, name, min_age, max_age, gender, description, active";

#[async_trait]
impl GroupRepository for PgUnitOfWork {
    async fn insert_group(&mut self, group: &NewGroup) -> RepoResult<Group> {
        let row: Option<GroupRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO groups (name, min_age, max_age, gender, description, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (lower(name)) DO NOTHING
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&group.name)
        .bind(group.min_age)
        .bind(group.max_age)
        .bind(group.gender.map(|g| g.as_str()))
        .bind(&group.description)
        .bind(group.active)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| RepoError::unique(constraints::GROUP_NAME))?
            .try_into()
    }

    async fn update_group(&mut self, id: Uuid, group: &NewGroup) -> RepoResult<Group> {
        let row: Option<GroupRow> = sqlx::query_as(&format!(
            r#"
            UPDATE groups
            SET name = $2, min_age = $3, max_age = $4, gender = $5, description = $6, active = $7
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&group.name)
        .bind(group.min_age)
        .bind(group.max_age)
        .bind(group.gender.map(|g| g.as_str()))
        .bind(&group.description)
        .bind(group.active)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| RepoError::not_found("group", id))?
            .try_into()
    }

    async fn get_group(&mut self, id: Uuid) -> RepoResult<Option<Group>> {
        let row: Option<GroupRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM groups WHERE id = $1"))
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(db_err)?;

        row.map(Group::try_from).transpose()
    }

    async fn list_groups(&mut self, active_only: bool) -> RepoResult<Vec<Group>> {
        let rows: Vec<GroupRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS} FROM groups
            WHERE active OR NOT $1
            ORDER BY min_age, name
            "#
        ))
        .bind(active_only)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Group::try_from).collect()
    }

    async fn group_membership_count(&mut self, id: Uuid) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memberships WHERE group_id = $1")
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(count)
    }

    async fn delete_group(&mut self, id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM event_groups WHERE group_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
