use tracing::{info, instrument};
use uuid::Uuid;

use super::address::{ensure_address, release_address, release_if_replaced};
use crate::domain::validation::same_text;
use crate::domain::{
    AgreementForm, NewSponsor, Sponsor, SponsorForm, SponsorProfile, SponsorView,
    SponsorshipAgreement,
};
use crate::error::{CoreError, Result};
use crate::repository::{AddressRepository, SponsorRepository, UnitOfWork, WorkYearRepository};

async fn prepare(
    uow: &mut dyn UnitOfWork,
    profile: &SponsorProfile,
    except: Option<Uuid>,
) -> Result<NewSponsor> {
    let taken = uow.list_sponsors().await?.iter().any(|s| {
        Some(s.id) != except && same_text(&s.company_name, &profile.company_name)
    });
    if taken {
        return Err(CoreError::conflict(format!(
            "sponsor '{}' already exists",
            profile.company_name
        )));
    }
    let address_id = match &profile.address {
        Some(address) => Some(ensure_address(uow, address).await?.id),
        None => None,
    };
    Ok(profile.sponsor(address_id))
}

#[instrument(skip_all, fields(company = %form.company_name))]
pub async fn create_sponsor(uow: &mut dyn UnitOfWork, form: &SponsorForm) -> Result<Sponsor> {
    let new = prepare(uow, &form.validate()?, None).await?;
    let sponsor = uow.insert_sponsor(&new).await?;
    info!(sponsor_id = %sponsor.id, "sponsor created");
    Ok(sponsor)
}

#[instrument(skip_all, fields(sponsor_id = %id))]
pub async fn update_sponsor(
    uow: &mut dyn UnitOfWork,
    id: Uuid,
    form: &SponsorForm,
) -> Result<Sponsor> {
    let existing = find_sponsor(uow, id).await?;
    let new = prepare(uow, &form.validate()?, Some(id)).await?;
    let sponsor = uow.update_sponsor(id, &new).await?;
    release_if_replaced(uow, existing.address_id, sponsor.address_id).await?;
    Ok(sponsor)
}

/// Ordered by company name
pub async fn list_sponsors(uow: &mut dyn UnitOfWork) -> Result<Vec<Sponsor>> {
    Ok(uow.list_sponsors().await?)
}

async fn find_sponsor(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Sponsor> {
    uow.get_sponsor(id)
        .await?
        .ok_or_else(|| CoreError::not_found("sponsor", id))
}

/// Sponsor with its address and agreements, newest work-year first
pub async fn get_sponsor(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<SponsorView> {
    let sponsor = find_sponsor(uow, id).await?;
    let address = match sponsor.address_id {
        Some(address_id) => uow.get_address(address_id).await?,
        None => None,
    };
    Ok(SponsorView {
        agreements: uow.agreements_of(id).await?,
        sponsor,
        address,
    })
}

/// One agreement per sponsor and work-year.
#[instrument(skip_all, fields(sponsor_id = %sponsor_id, work_year_id = %form.work_year_id))]
pub async fn add_agreement(
    uow: &mut dyn UnitOfWork,
    sponsor_id: Uuid,
    form: &AgreementForm,
) -> Result<SponsorshipAgreement> {
    let new = form.validate(sponsor_id)?;
    let sponsor = find_sponsor(uow, sponsor_id).await?;
    let work_year = uow
        .get_work_year(new.work_year_id)
        .await?
        .ok_or_else(|| CoreError::not_found("work-year", new.work_year_id))?;

    let exists = uow
        .agreements_of(sponsor_id)
        .await?
        .iter()
        .any(|a| a.work_year_id == work_year.id);
    if exists {
        return Err(CoreError::conflict(format!(
            "{} already has an agreement for {}",
            sponsor.company_name, work_year.name
        )));
    }

    let agreement = uow.insert_agreement(&new).await?;
    info!(agreement_id = %agreement.id, amount = %agreement.amount, "agreement added");
    Ok(agreement)
}

#[instrument(skip_all, fields(agreement_id = %id))]
pub async fn mark_agreement_paid(
    uow: &mut dyn UnitOfWork,
    id: Uuid,
) -> Result<SponsorshipAgreement> {
    if uow.get_agreement(id).await?.is_none() {
        return Err(CoreError::not_found("agreement", id));
    }
    let agreement = uow.set_agreement_paid(id, true).await?;
    info!("agreement paid");
    Ok(agreement)
}

#[instrument(skip_all, fields(agreement_id = %id))]
pub async fn remove_agreement(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<()> {
    uow.delete_agreement(id).await?;
    info!("agreement removed");
    Ok(())
}

/// Delete a sponsor with its agreements and release its address.
#[instrument(skip_all, fields(sponsor_id = %id))]
pub async fn delete_sponsor(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<()> {
    let Some(sponsor) = uow.get_sponsor(id).await? else {
        return Ok(());
    };
    uow.delete_agreements_of(id).await?;
    uow.delete_sponsor(id).await?;
    if let Some(address_id) = sponsor.address_id {
        release_address(uow, address_id).await?;
    }
    info!("sponsor deleted");
    Ok(())
}
