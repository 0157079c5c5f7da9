use async_trait::async_trait;
use tracing::debug;

use subprov_domain::{DomainError, DomainResult, SubscriberDevice, SubscriberDeviceRepository};

use crate::client::PostgresClient;
use crate::models::subscriber_device_from_row;

const COLUMNS: &str = "id, subscriber_id, serial_number, configuration, created, modified";

#[derive(Clone)]
pub struct PostgresSubscriberDeviceRepository {
    client: PostgresClient,
}

impl PostgresSubscriberDeviceRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }

    async fn get_by(&self, column: &str, value: &str) -> DomainResult<Option<SubscriberDevice>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let query = format!(
            "SELECT {} FROM subscriber_devices WHERE {} = $1",
            COLUMNS, column
        );
        let row = conn
            .query_opt(&query, &[&value])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.map(|r| subscriber_device_from_row(&r)))
    }
}

#[async_trait]
impl SubscriberDeviceRepository for PostgresSubscriberDeviceRepository {
    async fn create(&self, device: SubscriberDevice) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        conn.execute(
            "INSERT INTO subscriber_devices (id, subscriber_id, serial_number, configuration, \
             created, modified) VALUES ($1, $2, $3, $4, $5, $6)",
            &[
                &device.id,
                &device.subscriber_id,
                &device.serial_number,
                &device.configuration,
                &device.created,
                &device.modified,
            ],
        )
        .await
        .map_err(|e| DomainError::Repository(e.into()))?;

        debug!(device_id = %device.id, "Created subscriber device record");
        Ok(())
    }

    async fn update(&self, device: SubscriberDevice) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let updated = conn
            .execute(
                "UPDATE subscriber_devices SET subscriber_id = $2, serial_number = $3, \
                 configuration = $4, modified = $5 WHERE id = $1",
                &[
                    &device.id,
                    &device.subscriber_id,
                    &device.serial_number,
                    &device.configuration,
                    &device.modified,
                ],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        if updated == 0 {
            return Err(DomainError::RecordNotUpdated);
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<SubscriberDevice>> {
        self.get_by("id", id).await
    }

    async fn get_by_serial(&self, serial: &str) -> DomainResult<Option<SubscriberDevice>> {
        self.get_by("serial_number", serial).await
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let deleted = conn
            .execute("DELETE FROM subscriber_devices WHERE id = $1", &[&id])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(deleted > 0)
    }
}
