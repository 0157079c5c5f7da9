use async_trait::async_trait;
use tracing::debug;

use subprov_domain::{DomainError, DomainResult, GroupsMapRecord, GroupsMapRepository};

use crate::client::PostgresClient;
use crate::models::groups_map_from_row;

#[derive(Clone)]
pub struct PostgresGroupsMapRepository {
    client: PostgresClient,
}

impl PostgresGroupsMapRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GroupsMapRepository for PostgresGroupsMapRepository {
    async fn get(&self, subscriber_id: &str) -> DomainResult<Option<GroupsMapRecord>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let row = conn
            .query_opt(
                "SELECT subscriber_id, group_id FROM groupsmap WHERE subscriber_id = $1",
                &[&subscriber_id],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.map(|r| groups_map_from_row(&r)))
    }

    async fn exists(&self, subscriber_id: &str) -> DomainResult<bool> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let row = conn
            .query_opt(
                "SELECT 1 FROM groupsmap WHERE subscriber_id = $1",
                &[&subscriber_id],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.is_some())
    }

    async fn create(&self, record: GroupsMapRecord) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        conn.execute(
            "INSERT INTO groupsmap (subscriber_id, group_id) VALUES ($1, $2)",
            &[&record.subscriber_id, &record.group_id],
        )
        .await
        .map_err(|e| DomainError::Repository(e.into()))?;

        debug!(
            subscriber_id = %record.subscriber_id,
            group_id = record.group_id,
            "Created groups-map record"
        );
        Ok(())
    }

    async fn delete(&self, subscriber_id: &str) -> DomainResult<bool> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let deleted = conn
            .execute(
                "DELETE FROM groupsmap WHERE subscriber_id = $1",
                &[&subscriber_id],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(deleted > 0)
    }

    async fn max_group_id(&self) -> DomainResult<i64> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let row = conn
            .query_one("SELECT COALESCE(MAX(group_id), 0) FROM groupsmap", &[])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.get(0))
    }
}
