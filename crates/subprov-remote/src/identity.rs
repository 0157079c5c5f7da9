use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use subprov_domain::{DomainResult, IdentityClient, RemoteResponse, SignupUserRequest};

use crate::{read_response, transport_error};

/// HTTP client for the identity/security service's signup endpoint.
pub struct HttpIdentityClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpIdentityClient {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            base_url,
        })
    }
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    async fn create_or_resend_user(
        &self,
        req: SignupUserRequest,
    ) -> DomainResult<RemoteResponse> {
        debug!(email = %req.email, signup_id = %req.signup_id, "Forwarding signup to identity service");

        let response = self
            .http
            .post(format!("{}/api/v1/signup", self.base_url))
            .query(&[
                ("email", req.email.as_str()),
                ("signupUUID", req.signup_id.as_str()),
                ("owner", req.owner.as_str()),
                ("operatorName", req.operator_name.as_str()),
                ("resend", if req.resend { "true" } else { "false" }),
            ])
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(transport_error)?;

        read_response(response).await
    }
}
