use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Event, EventFilter, EventForm, NewEvent, WorkYear};
use crate::error::{CoreError, Result};
use crate::repository::{EventRepository, GroupRepository, UnitOfWork, WorkYearRepository};

/// Work-year the event falls in; every target group must exist.
async fn prepare(uow: &mut dyn UnitOfWork, new: &NewEvent) -> Result<WorkYear> {
    let date = new.starts_on();
    let work_year = uow
        .work_year_containing(date)
        .await?
        .ok_or(CoreError::NoWorkYearForDate { date })?;
    for group_id in &new.group_ids {
        if uow.get_group(*group_id).await?.is_none() {
            return Err(CoreError::not_found("group", group_id));
        }
    }
    Ok(work_year)
}

#[instrument(skip_all, fields(title = %form.title))]
pub async fn create_event(uow: &mut dyn UnitOfWork, form: &EventForm) -> Result<Event> {
    let new = form.validate()?;
    let work_year = prepare(uow, &new).await?;
    let event = uow.insert_event(work_year.id, &new).await?;
    info!(event_id = %event.id, work_year = %work_year.name, "event created");
    Ok(event)
}

#[instrument(skip_all, fields(event_id = %id))]
pub async fn update_event(uow: &mut dyn UnitOfWork, id: Uuid, form: &EventForm) -> Result<Event> {
    get_event(uow, id).await?;
    let new = form.validate()?;
    let work_year = prepare(uow, &new).await?;
    Ok(uow.update_event(id, work_year.id, &new).await?)
}

/// Ordered by start
pub async fn list_events(uow: &mut dyn UnitOfWork, filter: EventFilter) -> Result<Vec<Event>> {
    Ok(uow.list_events(filter).await?)
}

pub async fn get_event(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Event> {
    uow.get_event(id)
        .await?
        .ok_or_else(|| CoreError::not_found("event", id))
}

#[instrument(skip_all, fields(event_id = %id))]
pub async fn delete_event(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<()> {
    uow.delete_event(id).await?;
    info!("event deleted");
    Ok(())
}
