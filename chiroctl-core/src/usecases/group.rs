use chrono::NaiveDate;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::validation::same_text;
use crate::domain::{self, Gender, Group, GroupForm, NewGroup, WorkYear};
use crate::error::{CoreError, Result};
use crate::repository::{GroupRepository, UnitOfWork};

#[instrument(skip_all, fields(name = %form.name))]
pub async fn create_group(uow: &mut dyn UnitOfWork, form: &GroupForm) -> Result<Group> {
    let new = form.validate()?;
    reject_duplicate_name(uow, &new, None).await?;
    let group = uow.insert_group(&new).await?;
    info!(group_id = %group.id, "group created");
    Ok(group)
}

#[instrument(skip_all, fields(group_id = %id))]
pub async fn update_group(uow: &mut dyn UnitOfWork, id: Uuid, form: &GroupForm) -> Result<Group> {
    get_group(uow, id).await?;
    let new = form.validate()?;
    reject_duplicate_name(uow, &new, Some(id)).await?;
    Ok(uow.update_group(id, &new).await?)
}

async fn reject_duplicate_name(
    uow: &mut dyn UnitOfWork,
    new: &NewGroup,
    except: Option<Uuid>,
) -> Result<()> {
    let taken = uow
        .list_groups(false)
        .await?
        .iter()
        .any(|g| Some(g.id) != except && same_text(&g.name, &new.name));
    if taken {
        return Err(CoreError::conflict(format!(
            "a group named '{}' already exists",
            new.name
        )));
    }
    Ok(())
}

/// Ordered by minimum age, then name
pub async fn list_groups(uow: &mut dyn UnitOfWork, active_only: bool) -> Result<Vec<Group>> {
    Ok(uow.list_groups(active_only).await?)
}

pub async fn get_group(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Group> {
    uow.get_group(id)
        .await?
        .ok_or_else(|| CoreError::not_found("group", id))
}

/// Group for a member born on `birth_date` during `work_year`.
pub async fn resolve_group(
    uow: &mut dyn UnitOfWork,
    birth_date: NaiveDate,
    gender: Gender,
    work_year: &WorkYear,
) -> Result<Group> {
    let groups = uow.list_groups(true).await?;
    let age = work_year.age_of(birth_date);
    domain::resolve_group(&groups, age, gender)
        .cloned()
        .ok_or(CoreError::NoMatchingGroup { age, gender })
}

/// Existing group that still accepts new memberships.
pub(crate) async fn active_group(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Group> {
    let group = get_group(uow, id).await?;
    if !group.active {
        return Err(CoreError::conflict(format!(
            "group '{}' is not active",
            group.name
        )));
    }
    Ok(group)
}

/// Refused while memberships point at the group; event targets are dropped.
#[instrument(skip_all, fields(group_id = %id))]
pub async fn delete_group(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<()> {
    if uow.get_group(id).await?.is_none() {
        return Ok(());
    }
    let memberships = uow.group_membership_count(id).await?;
    if memberships > 0 {
        return Err(CoreError::in_use(
            "group",
            format!("{memberships} memberships reference it"),
        ));
    }
    uow.delete_group(id).await?;
    info!("group deleted");
    Ok(())
}
