use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainResult;

/// Raw answer from a collaborator. Non-success statuses are not errors at
/// this layer: callers decide whether to pass them through verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request forwarded to the identity service on signup.
#[derive(Debug, Clone, Serialize)]
pub struct SignupUserRequest {
    pub email: String,
    pub signup_id: String,
    pub owner: String,
    pub operator_name: String,
    pub resend: bool,
}

/// One venue entry in an open-board request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardVenue {
    pub id: String,
    pub name: String,
    pub retention: u64,
    pub interval: u64,
    #[serde(rename = "monitorSubVenues")]
    pub monitor_sub_venues: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenBoardRequest {
    pub name: String,
    #[serde(rename = "venueList")]
    pub venue_list: Vec<BoardVenue>,
}

/// Remote identity/security service creating or re-sending user credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityClient: Send + Sync {
    async fn create_or_resend_user(&self, req: SignupUserRequest)
        -> DomainResult<RemoteResponse>;
}

/// Remote analytics service opening and closing monitoring boards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsClient: Send + Sync {
    async fn open_board(&self, req: OpenBoardRequest) -> DomainResult<RemoteResponse>;
    async fn close_board(&self, board_id: &str) -> DomainResult<u16>;
}

/// Remote group-management service ("CGW"). Operations answer with a plain
/// success flag; the reconciler only ever logs failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupGatewayClient: Send + Sync {
    async fn create_group(&self, group_id: i64) -> DomainResult<bool>;
    async fn delete_group(&self, group_id: i64) -> DomainResult<bool>;
    async fn add_device_to_group(&self, group_id: i64, mac: &str) -> DomainResult<bool>;
    async fn delete_device_from_group(&self, group_id: i64, mac: &str) -> DomainResult<bool>;
}

/// Remote device gateway pushing configuration to a device.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceGatewayClient: Send + Sync {
    async fn push_configuration(
        &self,
        serial_number: &str,
        configuration: serde_json::Value,
    ) -> DomainResult<bool>;
}
