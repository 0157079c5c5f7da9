use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use subprov_domain::{AnalyticsClient, DomainResult, OpenBoardRequest, RemoteResponse};

use crate::{read_response, transport_error};

/// HTTP client for the analytics service's board endpoints. Board calls get
/// a generous timeout: opening a board can take a while on the remote side.
pub struct HttpAnalyticsClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAnalyticsClient {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            base_url,
        })
    }
}

#[async_trait]
impl AnalyticsClient for HttpAnalyticsClient {
    async fn open_board(&self, req: OpenBoardRequest) -> DomainResult<RemoteResponse> {
        debug!(board_name = %req.name, "Opening monitoring board");

        let response = self
            .http
            .post(format!("{}/api/v1/board/0", self.base_url))
            .json(&req)
            .send()
            .await
            .map_err(transport_error)?;

        read_response(response).await
    }

    async fn close_board(&self, board_id: &str) -> DomainResult<u16> {
        debug!(board_id = %board_id, "Closing monitoring board");

        let response = self
            .http
            .delete(format!("{}/api/v1/board/{}", self.base_url, board_id))
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().as_u16())
    }
}
