use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::group::{active_group, resolve_group};
use crate::domain::{Member, Membership, NewMembership, PaymentForm, PaymentState, WorkYear};
use crate::error::{CoreError, Result};
use crate::repository::{MembershipRepository, UnitOfWork};

/// Membership for a work-year and whether this call created it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    #[serde(flatten)]
    pub membership: Membership,
    pub created: bool,
}

/// Enroll `member` into `work_year`, keeping an existing membership.
///
/// An existing membership keeps its payment state; its group only changes
/// when `group_id` is given explicitly.
pub(crate) async fn enroll(
    uow: &mut dyn UnitOfWork,
    member: &Member,
    work_year: &WorkYear,
    group_id: Option<Uuid>,
) -> Result<Enrollment> {
    let explicit = match group_id {
        Some(id) => Some(active_group(uow, id).await?),
        None => None,
    };

    if let Some(existing) = uow.find_membership(member.id, work_year.id).await? {
        return keep_existing(uow, existing, explicit.map(|g| g.id)).await;
    }

    let group = match explicit {
        Some(group) => group,
        None => resolve_group(uow, member.birth_date, member.gender, work_year).await?,
    };
    let new = NewMembership {
        member_id: member.id,
        work_year_id: work_year.id,
        group_id: group.id,
    };
    match uow.insert_membership(&new).await {
        Ok(membership) => {
            info!(membership_id = %membership.id, group = %group.name, "member enrolled");
            Ok(Enrollment {
                membership,
                created: true,
            })
        }
        Err(err) if err.is_unique_violation() => {
            let existing = uow
                .find_membership(member.id, work_year.id)
                .await?
                .ok_or_else(|| CoreError::from(err))?;
            keep_existing(uow, existing, group_id).await
        }
        Err(err) => Err(err.into()),
    }
}

async fn keep_existing(
    uow: &mut dyn UnitOfWork,
    existing: Membership,
    group_id: Option<Uuid>,
) -> Result<Enrollment> {
    debug!(membership_id = %existing.id, "member already enrolled");
    let membership = match group_id {
        Some(group_id) if group_id != existing.group_id => {
            uow.set_membership_group(existing.id, group_id).await?
        }
        _ => existing,
    };
    Ok(Enrollment {
        membership,
        created: false,
    })
}

async fn get_membership(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Membership> {
    uow.get_membership(id)
        .await?
        .ok_or_else(|| CoreError::not_found("membership", id))
}

/// Mark a membership as paid; `paid_on` defaults to `today` and may not lie after it.
#[instrument(skip_all, fields(membership_id = %id, method = %form.method))]
pub async fn record_payment(
    uow: &mut dyn UnitOfWork,
    id: Uuid,
    form: &PaymentForm,
    today: NaiveDate,
) -> Result<Membership> {
    let paid_on = form.paid_on.unwrap_or(today);
    if paid_on > today {
        return Err(crate::domain::ValidationError::OutOfRange {
            field: "paid_on",
            reason: "must not be in the future",
        }
        .into());
    }
    get_membership(uow, id).await?;
    let membership = uow
        .set_payment(
            id,
            PaymentState {
                paid: true,
                paid_on: Some(paid_on),
                payment_method: Some(form.method),
            },
        )
        .await?;
    info!(%paid_on, "payment recorded");
    Ok(membership)
}

#[instrument(skip_all, fields(membership_id = %id))]
pub async fn clear_payment(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Membership> {
    get_membership(uow, id).await?;
    let membership = uow.set_payment(id, PaymentState::default()).await?;
    info!("payment cleared");
    Ok(membership)
}

/// Move a membership to another active group.
#[instrument(skip_all, fields(membership_id = %id, group_id = %group_id))]
pub async fn change_group(
    uow: &mut dyn UnitOfWork,
    id: Uuid,
    group_id: Uuid,
) -> Result<Membership> {
    get_membership(uow, id).await?;
    let group = active_group(uow, group_id).await?;
    let membership = uow.set_membership_group(id, group.id).await?;
    info!(group = %group.name, "membership moved");
    Ok(membership)
}
