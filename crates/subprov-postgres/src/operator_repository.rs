use async_trait::async_trait;

use subprov_domain::{DomainError, DomainResult, Operator, OperatorRepository};

use crate::client::PostgresClient;
use crate::models::operator_from_row;

#[derive(Clone)]
pub struct PostgresOperatorRepository {
    client: PostgresClient,
}

impl PostgresOperatorRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OperatorRepository for PostgresOperatorRepository {
    async fn get_by_registration_id(
        &self,
        registration_id: &str,
    ) -> DomainResult<Option<Operator>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let row = conn
            .query_opt(
                "SELECT id, registration_id, entity_id FROM operators \
                 WHERE registration_id = $1",
                &[&registration_id],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.map(|r| operator_from_row(&r)))
    }
}
