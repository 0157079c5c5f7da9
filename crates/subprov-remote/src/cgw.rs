use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use subprov_domain::{DomainResult, GroupGatewayClient};

use crate::transport_error;

/// HTTP client for the group-management service ("CGW").
pub struct HttpGroupGatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGroupGatewayClient {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            base_url,
        })
    }
}

#[async_trait]
impl GroupGatewayClient for HttpGroupGatewayClient {
    async fn create_group(&self, group_id: i64) -> DomainResult<bool> {
        info!(group_id, "Creating remote group");

        let response = self
            .http
            .post(format!("{}/api/v1/groups", self.base_url))
            .json(&serde_json::json!({ "group_id": group_id }))
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().is_success())
    }

    async fn delete_group(&self, group_id: i64) -> DomainResult<bool> {
        info!(group_id, "Deleting remote group");

        let response = self
            .http
            .delete(format!("{}/api/v1/groups", self.base_url))
            .query(&[("id", group_id.to_string())])
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().is_success())
    }

    async fn add_device_to_group(&self, group_id: i64, mac: &str) -> DomainResult<bool> {
        info!(group_id, mac = %mac, "Adding device to remote group");

        let response = self
            .http
            .post(format!("{}/api/v1/groups/{}/infra", self.base_url, group_id))
            .json(&serde_json::json!({ "mac_addrs": [mac] }))
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().is_success())
    }

    async fn delete_device_from_group(&self, group_id: i64, mac: &str) -> DomainResult<bool> {
        info!(group_id, mac = %mac, "Deleting device from remote group");

        let response = self
            .http
            .delete(format!("{}/api/v1/groups/{}/infra", self.base_url, group_id))
            .json(&serde_json::json!({ "mac_addrs": [mac] }))
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().is_success())
    }
}
