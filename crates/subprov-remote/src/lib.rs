pub mod analytics;
pub mod cgw;
pub mod gateway;
pub mod identity;

pub use analytics::HttpAnalyticsClient;
pub use cgw::HttpGroupGatewayClient;
pub use gateway::HttpDeviceGatewayClient;
pub use identity::HttpIdentityClient;

use subprov_domain::{DomainError, DomainResult, RemoteResponse};

pub(crate) async fn read_response(response: reqwest::Response) -> DomainResult<RemoteResponse> {
    let status = response.status().as_u16();
    let body = response
        .json::<serde_json::Value>()
        .await
        .unwrap_or(serde_json::Value::Null);
    Ok(RemoteResponse { status, body })
}

pub(crate) fn transport_error(e: reqwest::Error) -> DomainError {
    DomainError::Remote(e.to_string())
}
