use async_trait::async_trait;
use tracing::debug;

use subprov_domain::{DomainError, DomainResult, SignupEntry, SignupRepository};

use crate::client::PostgresClient;
use crate::models::SignupRow;

/// PostgreSQL implementation of SignupRepository.
#[derive(Clone)]
pub struct PostgresSignupRepository {
    client: PostgresClient,
}

impl PostgresSignupRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }

    async fn get_by(&self, column: &str, value: &str) -> DomainResult<Option<SignupEntry>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let query = format!(
            "SELECT {} FROM signups WHERE {} = $1 LIMIT 1",
            SignupRow::COLUMNS,
            column
        );
        let row = conn
            .query_opt(&query, &[&value])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.map(|r| SignupRow::from_row(&r).into()))
    }

    async fn list_by(
        &self,
        column: &str,
        value: &str,
        limit: usize,
    ) -> DomainResult<Vec<SignupEntry>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let query = format!(
            "SELECT {} FROM signups WHERE {} = $1 ORDER BY created DESC LIMIT $2",
            SignupRow::COLUMNS,
            column
        );
        let rows = conn
            .query(&query, &[&value, &(limit as i64)])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(rows
            .iter()
            .map(|r| SignupRow::from_row(r).into())
            .collect())
    }

    async fn delete_by(&self, column: &str, value: &str) -> DomainResult<bool> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let query = format!("DELETE FROM signups WHERE {} = $1", column);
        let deleted = conn
            .execute(&query, &[&value])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(deleted > 0)
    }
}

#[async_trait]
impl SignupRepository for PostgresSignupRepository {
    async fn create(&self, entry: SignupEntry) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        conn.execute(
            "INSERT INTO signups (id, email, serial_number, mac_address, device_id, \
             registration_id, user_id, operator_id, status, completed, error, created, \
             modified, submitted) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            &[
                &entry.id,
                &entry.email,
                &entry.serial_number,
                &entry.mac_address,
                &entry.device_id,
                &entry.registration_id,
                &entry.user_id,
                &entry.operator_id,
                &entry.status.as_str(),
                &entry.completed,
                &entry.error,
                &entry.created,
                &entry.modified,
                &entry.submitted,
            ],
        )
        .await
        .map_err(|e| DomainError::Repository(e.into()))?;

        debug!(signup_id = %entry.id, "Created signup record");
        Ok(())
    }

    async fn update(&self, entry: SignupEntry) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let updated = conn
            .execute(
                "UPDATE signups SET email = $2, serial_number = $3, mac_address = $4, \
                 device_id = $5, registration_id = $6, user_id = $7, operator_id = $8, \
                 status = $9, completed = $10, error = $11, modified = $12, submitted = $13 \
                 WHERE id = $1",
                &[
                    &entry.id,
                    &entry.email,
                    &entry.serial_number,
                    &entry.mac_address,
                    &entry.device_id,
                    &entry.registration_id,
                    &entry.user_id,
                    &entry.operator_id,
                    &entry.status.as_str(),
                    &entry.completed,
                    &entry.error,
                    &entry.modified,
                    &entry.submitted,
                ],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        if updated == 0 {
            return Err(DomainError::RecordNotUpdated);
        }
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> DomainResult<Option<SignupEntry>> {
        self.get_by("id", id).await
    }

    async fn get_by_user_id(&self, user_id: &str) -> DomainResult<Option<SignupEntry>> {
        self.get_by("user_id", user_id).await
    }

    async fn get_by_email(&self, email: &str) -> DomainResult<Option<SignupEntry>> {
        self.get_by("email", email).await
    }

    async fn get_by_mac(&self, mac: &str) -> DomainResult<Option<SignupEntry>> {
        self.get_by("mac_address", mac).await
    }

    async fn list_by_email(&self, email: &str, limit: usize) -> DomainResult<Vec<SignupEntry>> {
        self.list_by("email", email, limit).await
    }

    async fn list_by_mac(&self, mac: &str, limit: usize) -> DomainResult<Vec<SignupEntry>> {
        self.list_by("mac_address", mac, limit).await
    }

    async fn list(&self, offset: usize, limit: usize) -> DomainResult<Vec<SignupEntry>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let query = format!(
            "SELECT {} FROM signups ORDER BY created DESC OFFSET $1 LIMIT $2",
            SignupRow::COLUMNS
        );
        let rows = conn
            .query(&query, &[&(offset as i64), &(limit as i64)])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(rows
            .iter()
            .map(|r| SignupRow::from_row(r).into())
            .collect())
    }

    async fn delete_by_id(&self, id: &str) -> DomainResult<bool> {
        self.delete_by("id", id).await
    }

    async fn delete_by_email(&self, email: &str) -> DomainResult<bool> {
        self.delete_by("email", email).await
    }

    async fn delete_by_serial(&self, serial: &str) -> DomainResult<bool> {
        self.delete_by("serial_number", serial).await
    }
}
