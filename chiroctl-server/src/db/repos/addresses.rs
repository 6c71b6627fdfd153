use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use chiroctl_core::domain::{Address, NewAddress};
use chiroctl_core::repository::{constraints, AddressRepository, RepoError, RepoResult};

use super::db_err;
use crate::db::PgUnitOfWork;

#[derive(Debug, FromRow)]
struct AddressRow {
    id: Uuid,
    street: String,
    house_number: String,
    bus: Option<String>,
    postal_code: String,
    municipality: String,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            street: row.street,
            house_number: row.house_number,
            bus: row.bus,
            postal_code: row.postal_code,
            municipality: row.municipality,
        }
    }
}

#[async_trait]
impl AddressRepository for PgUnitOfWork {
    async fn find_address(&mut self, address: &NewAddress) -> RepoResult<Option<Address>> {
        let row: Option<AddressRow> = sqlx::query_as(
            r#"
            SELECT id, street, house_number, bus, postal_code, municipality
            FROM addresses
            WHERE lower(street) = lower($1)
              AND lower(house_number) = lower($2)
              AND lower(coalesce(bus, '')) = lower(coalesce($3, ''))
              AND postal_code = $4
              AND lower(municipality) = lower($5)
            "#,
        )
        .bind(&address.street)
        .bind(&address.house_number)
        .bind(&address.bus)
        .bind(&address.postal_code)
        .bind(&address.municipality)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(row.map(Address::from))
    }

    async fn insert_address(&mut self, address: &NewAddress) -> RepoResult<Address> {
        let row: Option<AddressRow> = sqlx::query_as(
            r#"
            INSERT INTO addresses (street, house_number, bus, postal_code, municipality)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT DO NOTHING
            RETURNING id, street, house_number, bus, postal_code, municipality
            "#,
        )
        .bind(&address.street)
        .bind(&address.house_number)
        .bind(&address.bus)
        .bind(&address.postal_code)
        .bind(&address.municipality)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.map(Address::from)
            .ok_or_else(|| RepoError::unique(constraints::ADDRESS_NATURAL_KEY))
    }

    async fn get_address(&mut self, id: Uuid) -> RepoResult<Option<Address>> {
        let row: Option<AddressRow> = sqlx::query_as(
            "SELECT id, street, house_number, bus, postal_code, municipality FROM addresses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(row.map(Address::from))
    }

    async fn address_references(&mut self, id: Uuid) -> RepoResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM persons WHERE address_id = $1)
                 + (SELECT COUNT(*) FROM sponsors WHERE address_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(count)
    }

    async fn delete_address(&mut self, id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
