use async_trait::async_trait;

use subprov_domain::{DomainError, DomainResult, Entity, EntityRepository};

use crate::client::PostgresClient;
use crate::models::{entity_from_row, json_list};

#[derive(Clone)]
pub struct PostgresEntityRepository {
    client: PostgresClient,
}

impl PostgresEntityRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EntityRepository for PostgresEntityRepository {
    async fn get(&self, id: &str) -> DomainResult<Option<Entity>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let row = conn
            .query_opt("SELECT id, venues FROM entities WHERE id = $1", &[&id])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.map(|r| entity_from_row(&r)))
    }

    async fn update(&self, entity: Entity) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let updated = conn
            .execute(
                "UPDATE entities SET venues = $2 WHERE id = $1",
                &[&entity.id, &json_list(&entity.venues)],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        if updated == 0 {
            return Err(DomainError::RecordNotUpdated);
        }
        Ok(())
    }

    async fn exists(&self, id: &str) -> DomainResult<bool> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let row = conn
            .query_opt("SELECT 1 FROM entities WHERE id = $1", &[&id])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.is_some())
    }
}
