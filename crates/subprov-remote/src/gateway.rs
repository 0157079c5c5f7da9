use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use subprov_domain::{DeviceGatewayClient, DomainResult};

use crate::transport_error;

/// HTTP client for the device gateway's configuration push endpoint.
pub struct HttpDeviceGatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDeviceGatewayClient {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            base_url,
        })
    }
}

#[async_trait]
impl DeviceGatewayClient for HttpDeviceGatewayClient {
    async fn push_configuration(
        &self,
        serial_number: &str,
        configuration: serde_json::Value,
    ) -> DomainResult<bool> {
        debug!(serial = %serial_number, "Pushing device configuration");

        let response = self
            .http
            .post(format!(
                "{}/api/v1/device/{}/configure",
                self.base_url, serial_number
            ))
            .json(&serde_json::json!({
                "serialNumber": serial_number,
                "configuration": configuration,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().is_success())
    }
}
