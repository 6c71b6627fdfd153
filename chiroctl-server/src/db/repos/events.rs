use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::FromRow;
use uuid::Uuid;

use chiroctl_core::domain::{Event, EventFilter, NewEvent};
use chiroctl_core::repository::{EventRepository, RepoError, RepoResult};

use super::db_err;
use crate::db::PgUnitOfWork;

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    work_year_id: Uuid,
    title: String,
    description: Option<String>,
    location: Option<String>,
    starts_at: NaiveDateTime,
    ends_at: NaiveDateTime,
    group_ids: Vec<Uuid>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            work_year_id: row.work_year_id,
            title: row.title,
            description: row.description,
            location: row.location,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            group_ids: row.group_ids,
        }
    }
}

/// Event columns plus the sorted target groups
const SELECT_EVENT: &str = r#"
    SELECT e.id, e.work_year_id, e.title, e.description, e.location, e.starts_at, e.ends_at,
           ARRAY(
               SELECT eg.group_id FROM event_groups eg
               WHERE eg.event_id = e.id
               ORDER BY eg.group_id
           ) AS group_ids
    FROM events e
"#;

impl PgUnitOfWork {
    async fn replace_targets(&mut self, event_id: Uuid, group_ids: &[Uuid]) -> RepoResult<()> {
        sqlx::query("DELETE FROM event_groups WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;

        if !group_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO event_groups (event_id, group_id)
                SELECT $1, group_id FROM unnest($2::uuid[]) AS t(group_id)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(event_id)
            .bind(group_ids)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        }
        Ok(())
    }

    async fn fetch_event(&mut self, id: Uuid) -> RepoResult<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as(&format!("{SELECT_EVENT} WHERE e.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err)?;

        Ok(row.map(Event::from))
    }
}

#[async_trait]
impl EventRepository for PgUnitOfWork {
    async fn insert_event(&mut self, work_year_id: Uuid, event: &NewEvent) -> RepoResult<Event> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO events (work_year_id, title, description, location, starts_at, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(work_year_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)?;

        self.replace_targets(id, &event.group_ids).await?;
        Ok(Event::from_new(id, work_year_id, event))
    }

    async fn update_event(
        &mut self,
        id: Uuid,
        work_year_id: Uuid,
        event: &NewEvent,
    ) -> RepoResult<Event> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE events
            SET work_year_id = $2, title = $3, description = $4, location = $5,
                starts_at = $6, ends_at = $7
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(work_year_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        if updated.is_none() {
            return Err(RepoError::not_found("event", id));
        }
        self.replace_targets(id, &event.group_ids).await?;
        Ok(Event::from_new(id, work_year_id, event))
    }

    async fn get_event(&mut self, id: Uuid) -> RepoResult<Option<Event>> {
        self.fetch_event(id).await
    }

    async fn list_events(&mut self, filter: EventFilter) -> RepoResult<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            r#"
            {SELECT_EVENT}
            WHERE ($1::date IS NULL OR e.ends_at::date >= $1)
              AND ($2::date IS NULL OR e.starts_at::date <= $2)
              AND ($3::uuid IS NULL
                   OR NOT EXISTS (SELECT 1 FROM event_groups g WHERE g.event_id = e.id)
                   OR EXISTS (
                       SELECT 1 FROM event_groups g WHERE g.event_id = e.id AND g.group_id = $3
                   ))
              AND ($4::uuid IS NULL OR e.work_year_id = $4)
            ORDER BY e.starts_at, e.id
            "#
        ))
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.group_id)
        .bind(filter.work_year_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn delete_event(&mut self, id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
