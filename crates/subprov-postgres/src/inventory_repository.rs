use async_trait::async_trait;

use subprov_domain::{DomainError, DomainResult, InventoryRepository, InventoryTag};

use crate::client::PostgresClient;
use crate::models::inventory_from_row;

#[derive(Clone)]
pub struct PostgresInventoryRepository {
    client: PostgresClient,
}

impl PostgresInventoryRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InventoryRepository for PostgresInventoryRepository {
    async fn get_by_serial(&self, serial: &str) -> DomainResult<Option<InventoryTag>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let row = conn
            .query_opt(
                "SELECT id, serial_number, venue_id, created, modified FROM inventory \
                 WHERE serial_number = $1",
                &[&serial],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.map(|r| inventory_from_row(&r)))
    }

    async fn update(&self, tag: InventoryTag) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let updated = conn
            .execute(
                "UPDATE inventory SET serial_number = $2, venue_id = $3, modified = $4 \
                 WHERE id = $1",
                &[&tag.id, &tag.serial_number, &tag.venue_id, &tag.modified],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        if updated == 0 {
            return Err(DomainError::RecordNotUpdated);
        }
        Ok(())
    }
}
