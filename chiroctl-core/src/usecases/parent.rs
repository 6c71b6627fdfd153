use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::address::{ensure_address, release_if_replaced};
use crate::domain::{NewPerson, Parent, ParentForm, ParentProfile, ParentRelation};
use crate::error::{CoreError, Result};
use crate::repository::{ParentRepository, PersonRepository, UnitOfWork};

/// Create a parent or update the one registered under the same e-mail.
///
/// A parent without an address of its own lives at `default_address`.
pub async fn create_or_update_parent(
    uow: &mut dyn UnitOfWork,
    form: &ParentForm,
    default_address: Option<Uuid>,
) -> Result<Parent> {
    upsert_parent(uow, &form.validate()?, default_address).await
}

#[instrument(skip_all, fields(email = %profile.email.as_str()))]
pub async fn upsert_parent(
    uow: &mut dyn UnitOfWork,
    profile: &ParentProfile,
    default_address: Option<Uuid>,
) -> Result<Parent> {
    let address_id = match &profile.address {
        Some(address) => Some(ensure_address(uow, address).await?.id),
        None => default_address,
    };
    let person = profile.person(address_id);

    if let Some(existing) = uow.find_parent_by_email(&profile.email).await? {
        return update_existing(uow, existing, &person, profile.relation).await;
    }

    let inserted = uow.insert_person(&person).await?;
    match uow
        .insert_parent(inserted.id, &profile.email, profile.relation)
        .await
    {
        Ok(parent) => {
            info!(parent_id = %parent.id, "parent created");
            Ok(parent)
        }
        Err(err) if err.is_unique_violation() => {
            debug!("parent e-mail registered concurrently, updating instead");
            uow.delete_person(inserted.id).await?;
            let existing = uow
                .find_parent_by_email(&profile.email)
                .await?
                .ok_or_else(|| CoreError::from(err))?;
            update_existing(uow, existing, &person, profile.relation).await
        }
        Err(err) => Err(err.into()),
    }
}

async fn update_existing(
    uow: &mut dyn UnitOfWork,
    existing: Parent,
    person: &NewPerson,
    relation: ParentRelation,
) -> Result<Parent> {
    let previous = uow
        .get_person(existing.person_id)
        .await?
        .ok_or_else(|| CoreError::not_found("person", existing.person_id))?;
    uow.update_person(existing.person_id, person).await?;
    release_if_replaced(uow, previous.address_id, person.address_id).await?;

    let parent = if existing.relation != relation {
        uow.update_parent_relation(existing.id, relation).await?
    } else {
        existing
    };
    debug!(parent_id = %parent.id, "parent updated");
    Ok(parent)
}
