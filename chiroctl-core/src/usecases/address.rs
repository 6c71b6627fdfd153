use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{Address, AddressForm, NewAddress};
use crate::error::{CoreError, Result};
use crate::repository::{AddressRepository, UnitOfWork};

/// Validate the form and return the matching stored address, inserting it if new.
pub async fn create_or_get_address(
    uow: &mut dyn UnitOfWork,
    form: &AddressForm,
) -> Result<Address> {
    ensure_address(uow, &form.validate()?).await
}

/// Idempotent address lookup-or-insert for already validated input.
#[instrument(skip_all, fields(postal_code = %address.postal_code))]
pub async fn ensure_address(uow: &mut dyn UnitOfWork, address: &NewAddress) -> Result<Address> {
    if let Some(existing) = uow.find_address(address).await? {
        debug!(address_id = %existing.id, "address already known");
        return Ok(existing);
    }

    match uow.insert_address(address).await {
        Ok(inserted) => {
            info!(address_id = %inserted.id, "address created");
            Ok(inserted)
        }
        // Inserted concurrently by another unit of work
        Err(err) if err.is_unique_violation() => uow
            .find_address(address)
            .await?
            .ok_or_else(|| CoreError::from(err)),
        Err(err) => Err(err.into()),
    }
}

/// Delete an address nobody points at any more.
///
/// Returns whether the row was removed; referenced or unknown addresses are left alone.
#[instrument(skip_all, fields(address_id = %id))]
pub async fn release_address(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<bool> {
    if uow.get_address(id).await?.is_none() {
        return Ok(false);
    }
    let references = uow.address_references(id).await?;
    if references > 0 {
        debug!(references, "address still referenced");
        return Ok(false);
    }
    uow.delete_address(id).await?;
    info!("address released");
    Ok(true)
}

/// Release `old` when it differs from `new`.
pub(crate) async fn release_if_replaced(
    uow: &mut dyn UnitOfWork,
    old: Option<Uuid>,
    new: Option<Uuid>,
) -> Result<()> {
    if let Some(old) = old.filter(|old| Some(*old) != new) {
        release_address(uow, old).await?;
    }
    Ok(())
}
