use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::address::{ensure_address, release_address, release_if_replaced};
use super::membership::{enroll, Enrollment};
use super::parent::upsert_parent;
use super::work_year::current_work_year;
use crate::domain::{
    Member, MemberDetails, MemberFilter, MemberForm, MemberProfile, MemberSummary, ParentView,
    RegistrationForm, RegistrationOutcome,
};
use crate::error::{CoreError, Result};
use crate::pagination::{Paginated, Pagination};
use crate::repository::{
    AddressRepository, CareRepository, MemberRepository, MembershipRepository, ParentRepository,
    PersonRepository, UnitOfWork,
};

/// Register a member for the current work-year.
///
/// Re-submitting the same registration is safe: the member is matched on
/// name and birth date, parents on e-mail, addresses on their fields, and an
/// existing membership for the work-year is kept.
#[instrument(skip_all, fields(
    first_name = %form.member.first_name,
    last_name = %form.member.last_name,
))]
pub async fn register_member(
    uow: &mut dyn UnitOfWork,
    form: &RegistrationForm,
    today: NaiveDate,
) -> Result<RegistrationOutcome> {
    let registration = form.validate(today)?;
    let work_year = current_work_year(uow, today).await?;
    let address = ensure_address(uow, &registration.member.address).await?;

    let (member, member_created) =
        save_member(uow, &registration.member, Some(address.id)).await?;

    let mut parent_ids = Vec::with_capacity(registration.parents.len());
    for profile in &registration.parents {
        let parent = upsert_parent(uow, profile, Some(address.id)).await?;
        if uow.link_parent(member.id, parent.id).await? {
            debug!(parent_id = %parent.id, "parent linked");
        }
        parent_ids.push(parent.id);
    }

    uow.upsert_emergency_contact(member.id, &registration.emergency_contact)
        .await?;
    uow.upsert_medical(member.id, &registration.medical).await?;

    let Enrollment {
        membership,
        created: membership_created,
    } = enroll(uow, &member, &work_year, registration.group_id).await?;

    info!(
        member_id = %member.id,
        work_year = %work_year.name,
        member_created,
        membership_created,
        "registration processed"
    );
    Ok(RegistrationOutcome {
        member_id: member.id,
        membership_id: membership.id,
        work_year_id: work_year.id,
        group_id: membership.group_id,
        parent_ids,
        member_created,
        membership_created,
    })
}

/// Update the member matching the profile's identity, or insert a new one.
async fn save_member(
    uow: &mut dyn UnitOfWork,
    profile: &MemberProfile,
    address_id: Option<Uuid>,
) -> Result<(Member, bool)> {
    let existing = uow
        .find_member_by_identity(
            profile.first_name.as_str(),
            profile.last_name.as_str(),
            profile.birth_date,
        )
        .await?;

    match existing {
        Some(member) => {
            debug!(member_id = %member.id, "member already registered, updating");
            let member = overwrite_member(uow, &member, profile, address_id).await?;
            Ok((member, false))
        }
        None => {
            let person = uow.insert_person(&profile.person(address_id)).await?;
            let member = uow.insert_member(&profile.member(person.id)).await?;
            info!(member_id = %member.id, "member created");
            Ok((member, true))
        }
    }
}

async fn overwrite_member(
    uow: &mut dyn UnitOfWork,
    member: &Member,
    profile: &MemberProfile,
    address_id: Option<Uuid>,
) -> Result<Member> {
    let previous = uow
        .get_person(member.person_id)
        .await?
        .ok_or_else(|| CoreError::not_found("person", member.person_id))?;
    uow.update_person(member.person_id, &profile.person(address_id))
        .await?;
    let updated = uow
        .update_member(member.id, &profile.member(member.person_id))
        .await?;
    release_if_replaced(uow, previous.address_id, address_id).await?;
    Ok(updated)
}

/// Edit a member's personal data and address.
#[instrument(skip_all, fields(member_id = %id))]
pub async fn update_member(
    uow: &mut dyn UnitOfWork,
    id: Uuid,
    form: &MemberForm,
    today: NaiveDate,
) -> Result<MemberDetails> {
    let member = get_member(uow, id).await?;
    let profile = form.validate(today)?;

    let clash = uow
        .find_member_by_identity(
            profile.first_name.as_str(),
            profile.last_name.as_str(),
            profile.birth_date,
        )
        .await?;
    if clash.is_some_and(|other| other.id != id) {
        return Err(CoreError::conflict(
            "another member has the same name and birth date",
        ));
    }

    let address = ensure_address(uow, &profile.address).await?;
    overwrite_member(uow, &member, &profile, Some(address.id)).await?;
    info!("member updated");
    member_details(uow, id).await
}

/// Enroll an existing member into the current work-year.
#[instrument(skip_all, fields(member_id = %member_id))]
pub async fn renew_membership(
    uow: &mut dyn UnitOfWork,
    member_id: Uuid,
    group_id: Option<Uuid>,
    today: NaiveDate,
) -> Result<Enrollment> {
    let member = get_member(uow, member_id).await?;
    let work_year = current_work_year(uow, today).await?;
    enroll(uow, &member, &work_year, group_id).await
}

async fn get_member(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Member> {
    uow.get_member(id)
        .await?
        .ok_or_else(|| CoreError::not_found("member", id))
}

pub async fn member_details(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<MemberDetails> {
    let member = get_member(uow, id).await?;
    let person = uow
        .get_person(member.person_id)
        .await?
        .ok_or_else(|| CoreError::not_found("person", member.person_id))?;
    let address = match person.address_id {
        Some(address_id) => uow.get_address(address_id).await?,
        None => None,
    };

    let mut parents = Vec::new();
    for parent in uow.parents_of(id).await? {
        let person = uow
            .get_person(parent.person_id)
            .await?
            .ok_or_else(|| CoreError::not_found("person", parent.person_id))?;
        let address = match person.address_id {
            Some(address_id) => uow.get_address(address_id).await?,
            None => None,
        };
        parents.push(ParentView {
            parent,
            person,
            address,
        });
    }

    Ok(MemberDetails {
        emergency_contact: uow.emergency_contact_of(id).await?,
        medical: uow.medical_of(id).await?,
        memberships: uow.memberships_of(id).await?,
        member,
        person,
        address,
        parents,
    })
}

/// Ordered by last name, then first name
pub async fn list_members(
    uow: &mut dyn UnitOfWork,
    filter: MemberFilter,
    page: Pagination,
) -> Result<Paginated<MemberSummary>> {
    Ok(uow.list_members(filter, page).await?)
}

/// Remove a member and everything that only existed for them.
///
/// Parents still linked to a sibling stay, as do addresses someone else uses.
#[instrument(skip_all, fields(member_id = %id))]
pub async fn delete_member(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<()> {
    let Some(member) = uow.get_member(id).await? else {
        return Ok(());
    };
    let mut addresses = BTreeSet::new();

    let memberships = uow.delete_memberships_of(id).await?;
    uow.delete_care_of(id).await?;

    for parent_id in uow.unlink_parents(id).await? {
        if uow.parent_link_count(parent_id).await? > 0 {
            continue;
        }
        let Some(parent) = uow.get_parent(parent_id).await? else {
            continue;
        };
        if let Some(person) = uow.get_person(parent.person_id).await? {
            addresses.extend(person.address_id);
        }
        uow.delete_parent(parent_id).await?;
        uow.delete_person(parent.person_id).await?;
        debug!(%parent_id, "orphaned parent removed");
    }

    if let Some(person) = uow.get_person(member.person_id).await? {
        addresses.extend(person.address_id);
    }
    uow.delete_member(id).await?;
    uow.delete_person(member.person_id).await?;

    for address_id in addresses {
        release_address(uow, address_id).await?;
    }
    info!(memberships, "member deleted");
    Ok(())
}
