use chrono::NaiveDate;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{NewWorkYear, WorkYear, WorkYearForm};
use crate::error::{CoreError, Result};
use crate::repository::{UnitOfWork, WorkYearRepository};

#[instrument(skip_all, fields(name = %form.name))]
pub async fn create_work_year(uow: &mut dyn UnitOfWork, form: &WorkYearForm) -> Result<WorkYear> {
    let new = form.validate()?;
    reject_overlap(uow, &new, None).await?;
    let work_year = uow.insert_work_year(&new).await?;
    info!(work_year_id = %work_year.id, "work-year created");
    Ok(work_year)
}

#[instrument(skip_all, fields(work_year_id = %id))]
pub async fn update_work_year(
    uow: &mut dyn UnitOfWork,
    id: Uuid,
    form: &WorkYearForm,
) -> Result<WorkYear> {
    get_work_year(uow, id).await?;
    let new = form.validate()?;
    reject_overlap(uow, &new, Some(id)).await?;
    Ok(uow.update_work_year(id, &new).await?)
}

async fn reject_overlap(
    uow: &mut dyn UnitOfWork,
    new: &NewWorkYear,
    except: Option<Uuid>,
) -> Result<()> {
    let overlapping = uow
        .overlapping_work_years(new.start_date, new.end_date)
        .await?;
    match overlapping.iter().find(|wy| Some(wy.id) != except) {
        Some(other) => Err(CoreError::conflict(format!(
            "overlaps work-year '{}' ({} to {})",
            other.name, other.start_date, other.end_date
        ))),
        None => Ok(()),
    }
}

/// The work-year running on `today`.
pub async fn current_work_year(uow: &mut dyn UnitOfWork, today: NaiveDate) -> Result<WorkYear> {
    uow.work_year_containing(today)
        .await?
        .ok_or(CoreError::NoCurrentWorkYear { date: today })
}

pub async fn work_year_for_date(
    uow: &mut dyn UnitOfWork,
    date: NaiveDate,
) -> Result<Option<WorkYear>> {
    Ok(uow.work_year_containing(date).await?)
}

/// Newest first
pub async fn list_work_years(uow: &mut dyn UnitOfWork) -> Result<Vec<WorkYear>> {
    Ok(uow.list_work_years().await?)
}

pub async fn get_work_year(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<WorkYear> {
    uow.get_work_year(id)
        .await?
        .ok_or_else(|| CoreError::not_found("work-year", id))
}

#[instrument(skip_all, fields(work_year_id = %id))]
pub async fn delete_work_year(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<()> {
    if uow.get_work_year(id).await?.is_none() {
        return Ok(());
    }
    let usage = uow.work_year_usage(id).await?;
    if !usage.is_unused() {
        return Err(CoreError::in_use(
            "work-year",
            format!(
                "{} memberships, {} events and {} sponsorship agreements reference it",
                usage.memberships, usage.events, usage.agreements
            ),
        ));
    }
    uow.delete_work_year(id).await?;
    info!("work-year deleted");
    Ok(())
}
