use async_trait::async_trait;
use tracing::debug;

use subprov_domain::{DomainError, DomainResult, Venue, VenueRepository};

use crate::client::PostgresClient;
use crate::models::{json_list, venue_from_row};

const COLUMNS: &str = "id, name, entity_id, devices, boards, created, modified";

#[derive(Clone)]
pub struct PostgresVenueRepository {
    client: PostgresClient,
}

impl PostgresVenueRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VenueRepository for PostgresVenueRepository {
    async fn create(&self, venue: Venue) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let result = conn
            .execute(
                "INSERT INTO venues (id, name, entity_id, devices, boards, created, modified) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &venue.id,
                    &venue.name,
                    &venue.entity_id,
                    &json_list(&venue.devices),
                    &json_list(&venue.boards),
                    &venue.created,
                    &venue.modified,
                ],
            )
            .await;

        if let Err(e) = result {
            if let Some(db_err) = e.as_db_error() {
                // unique_violation on (name, entity_id)
                if db_err.code().code() == "23505" {
                    return Err(DomainError::VenueNameAlreadyExists(venue.name));
                }
            }
            return Err(DomainError::Repository(e.into()));
        }

        debug!(venue_id = %venue.id, "Created venue record");
        Ok(())
    }

    async fn update(&self, venue: Venue) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let updated = conn
            .execute(
                "UPDATE venues SET name = $2, entity_id = $3, devices = $4, boards = $5, \
                 modified = $6 WHERE id = $1",
                &[
                    &venue.id,
                    &venue.name,
                    &venue.entity_id,
                    &json_list(&venue.devices),
                    &json_list(&venue.boards),
                    &venue.modified,
                ],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        if updated == 0 {
            return Err(DomainError::RecordNotUpdated);
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Venue>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let query = format!("SELECT {} FROM venues WHERE id = $1", COLUMNS);
        let row = conn
            .query_opt(&query, &[&id])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.map(|r| venue_from_row(&r)))
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let deleted = conn
            .execute("DELETE FROM venues WHERE id = $1", &[&id])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(deleted > 0)
    }

    async fn name_exists(&self, name: &str, entity_id: &str) -> DomainResult<bool> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let row = conn
            .query_opt(
                "SELECT 1 FROM venues WHERE name = $1 AND entity_id = $2 LIMIT 1",
                &[&name, &entity_id],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.is_some())
    }
}
