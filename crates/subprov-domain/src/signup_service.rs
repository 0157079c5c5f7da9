use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::clients::{IdentityClient, SignupUserRequest};
use crate::error::{DomainError, DomainResult};
use crate::repository::{OperatorRepository, SignupRepository};
use crate::signup::{SignupEntry, SignupStatus};
use crate::validation;

const LIST_PAGE_SIZE: usize = 100;

/// Key used to address a signup entry: either its own id or the identity
/// service's user id.
#[derive(Debug, Clone)]
pub enum SignupKey {
    Id(String),
    UserId(String),
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub email: String,
    pub mac_address: String,
    pub device_id: String,
    pub registration_id: String,
    pub resend: bool,
}

/// Owns the signup lifecycle: creation, email verification, mac updates.
///
/// Conflict rules, checked in order:
/// 1. an entry for this email bound to a different mac rejects the request;
/// 2. an entry for this mac bound to a different email rejects the request;
/// 3. an entry for this exact pair is reused only when `resend` is set.
pub struct SignupService {
    signups: Arc<dyn SignupRepository>,
    operators: Arc<dyn OperatorRepository>,
    identity: Arc<dyn IdentityClient>,
}

impl SignupService {
    pub fn new(
        signups: Arc<dyn SignupRepository>,
        operators: Arc<dyn OperatorRepository>,
        identity: Arc<dyn IdentityClient>,
    ) -> Self {
        Self {
            signups,
            operators,
            identity,
        }
    }

    pub async fn signup(&self, req: SignupRequest) -> DomainResult<SignupEntry> {
        let email = validation::normalize(&req.email);
        let mac_address = validation::normalize(&req.mac_address);
        let device_id = validation::normalize(&req.device_id);
        let registration_id = validation::normalize(&req.registration_id);

        if email.is_empty() || mac_address.is_empty() || registration_id.is_empty() {
            return Err(DomainError::MissingOrInvalidParameters);
        }
        if !validation::valid_email(&email) {
            return Err(DomainError::InvalidEmailAddress(email));
        }
        if !validation::valid_serial_number(&mac_address) {
            return Err(DomainError::InvalidSerialNumber(mac_address));
        }

        info!(
            email = %email,
            mac = %mac_address,
            registration_id = %registration_id,
            resend = req.resend,
            "Signup request"
        );

        let operator = self
            .operators
            .get_by_registration_id(&registration_id)
            .await?
            .ok_or_else(|| DomainError::InvalidRegistrationOperator(registration_id.clone()))?;

        let by_email = self.signups.get_by_email(&email).await?;
        let by_mac = self.signups.get_by_mac(&mac_address).await?;

        // Email already tied to another device
        if let Some(entry) = &by_email {
            if !entry.mac_address.eq_ignore_ascii_case(&mac_address) {
                warn!(email = %email, existing_mac = %entry.mac_address,
                    "Email already registered to another device");
                return Err(DomainError::UserAlreadyExists(email));
            }
        }
        // Device already tied to another email
        if let Some(entry) = &by_mac {
            if !entry.email.eq_ignore_ascii_case(&email) {
                warn!(mac = %mac_address, existing_email = %entry.email,
                    "Device already provisioned to another subscriber");
                return Err(DomainError::SerialNumberAlreadyProvisioned(mac_address));
            }
        }

        // When the email matched, the mac matched too; reuse the entry only
        // on an explicit resend.
        let reuse = if req.resend { by_email } else { None };
        let signup_id = reuse
            .as_ref()
            .map(|entry| entry.id.clone())
            .unwrap_or_else(|| xid::new().to_string());

        debug!(
            signup_id = %signup_id,
            reuse = reuse.is_some(),
            "Forwarding signup to identity service"
        );

        let answer = self
            .identity
            .create_or_resend_user(SignupUserRequest {
                email: email.clone(),
                signup_id: signup_id.clone(),
                owner: operator.id.clone(),
                operator_name: operator.registration_id.clone(),
                resend: req.resend,
            })
            .await?;

        if !answer.is_success() {
            // Pass the identity service's status and body through unchanged.
            return Err(DomainError::RemoteRejected {
                status: answer.status,
                body: answer.body,
            });
        }

        let user_id = answer
            .body
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let now = Utc::now();
        let entry = if let Some(entry) = reuse {
            // Resend keeps the stored record as-is.
            self.signups.update(entry.clone()).await?;
            entry
        } else {
            let entry = SignupEntry {
                id: signup_id,
                email,
                serial_number: mac_address.clone(),
                mac_address,
                device_id,
                registration_id,
                user_id,
                operator_id: operator.id,
                status: SignupStatus::WaitingForEmail,
                completed: false,
                error: 0,
                created: Some(now),
                modified: Some(now),
                submitted: Some(now),
            };
            self.signups.create(entry.clone()).await?;
            entry
        };

        info!(signup_id = %entry.id, email = %entry.email, "Signup persisted");
        Ok(entry)
    }

    /// Called by the identity backend once the subscriber verified their
    /// email. Only valid from WaitingForEmail.
    pub async fn email_verified(&self, key: SignupKey) -> DomainResult<SignupEntry> {
        let mut entry = self.load(&key).await?;

        if entry.status != SignupStatus::WaitingForEmail {
            debug!(signup_id = %entry.id, status = ?entry.status,
                "emailVerified in wrong state, ignoring");
            return Err(DomainError::UnknownOperation);
        }

        info!(signup_id = %entry.id, email = %entry.email, "Email verified");
        entry.status = SignupStatus::WaitingForDevice;
        entry.modified = Some(Utc::now());
        self.signups.update(entry.clone()).await?;
        Ok(entry)
    }

    /// Update the mac binding. Valid in any status; an empty mac clears the
    /// binding.
    pub async fn update_mac(&self, key: SignupKey, mac: &str) -> DomainResult<SignupEntry> {
        let mut entry = self.load(&key).await?;
        let mac = validation::normalize(mac);

        info!(signup_id = %entry.id, mac = %mac, "Updating signup device");
        entry.mac_address = mac.clone();
        entry.serial_number = mac;
        entry.modified = Some(Utc::now());
        self.signups.update(entry.clone()).await?;
        Ok(entry)
    }

    pub async fn get(&self, id: &str) -> DomainResult<SignupEntry> {
        self.signups
            .get_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))
    }

    pub async fn list_by_email(&self, email: &str) -> DomainResult<Vec<SignupEntry>> {
        self.signups.list_by_email(email, LIST_PAGE_SIZE).await
    }

    pub async fn list_by_mac(&self, mac: &str) -> DomainResult<Vec<SignupEntry>> {
        self.signups.list_by_mac(mac, LIST_PAGE_SIZE).await
    }

    pub async fn list(&self) -> DomainResult<Vec<SignupEntry>> {
        self.signups.list(0, LIST_PAGE_SIZE).await
    }

    pub async fn delete_by_id(&self, id: &str) -> DomainResult<()> {
        if self.signups.delete_by_id(id).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound(id.to_string()))
        }
    }

    pub async fn delete_by_email(&self, email: &str) -> DomainResult<()> {
        if self.signups.delete_by_email(email).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound(email.to_string()))
        }
    }

    pub async fn delete_by_serial(&self, serial: &str) -> DomainResult<()> {
        if self.signups.delete_by_serial(serial).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound(serial.to_string()))
        }
    }

    async fn load(&self, key: &SignupKey) -> DomainResult<SignupEntry> {
        let found = match key {
            SignupKey::Id(id) if !id.is_empty() => self.signups.get_by_id(id).await?,
            SignupKey::UserId(user_id) if !user_id.is_empty() => {
                self.signups.get_by_user_id(user_id).await?
            }
            _ => return Err(DomainError::MissingOrInvalidParameters),
        };
        found.ok_or_else(|| match key {
            SignupKey::Id(id) => DomainError::NotFound(id.clone()),
            SignupKey::UserId(user_id) => DomainError::NotFound(user_id.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockIdentityClient, RemoteResponse};
    use crate::repository::{MockOperatorRepository, MockSignupRepository};

    fn test_operator() -> crate::operator::Operator {
        crate::operator::Operator {
            id: "op-1".to_string(),
            registration_id: "acme".to_string(),
            entity_id: "ent-1".to_string(),
        }
    }

    fn test_entry(id: &str, email: &str, mac: &str) -> SignupEntry {
        SignupEntry {
            id: id.to_string(),
            email: email.to_string(),
            serial_number: mac.to_string(),
            mac_address: mac.to_string(),
            device_id: String::new(),
            registration_id: "acme".to_string(),
            user_id: "user-1".to_string(),
            operator_id: "op-1".to_string(),
            status: SignupStatus::WaitingForEmail,
            completed: false,
            error: 0,
            created: Some(Utc::now()),
            modified: Some(Utc::now()),
            submitted: Some(Utc::now()),
        }
    }

    fn request(email: &str, mac: &str, resend: bool) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            mac_address: mac.to_string(),
            device_id: String::new(),
            registration_id: "acme".to_string(),
            resend,
        }
    }

    fn operator_repo_with_acme() -> MockOperatorRepository {
        let mut repo = MockOperatorRepository::new();
        repo.expect_get_by_registration_id()
            .returning(|_| Ok(Some(test_operator())));
        repo
    }

    fn identity_ok() -> MockIdentityClient {
        let mut identity = MockIdentityClient::new();
        identity.expect_create_or_resend_user().returning(|_| {
            Ok(RemoteResponse {
                status: 200,
                body: serde_json::json!({"id": "user-1"}),
            })
        });
        identity
    }

    #[tokio::test]
    async fn test_new_signup_creates_entry() {
        let mut signups = MockSignupRepository::new();
        signups.expect_get_by_email().returning(|_| Ok(None));
        signups.expect_get_by_mac().returning(|_| Ok(None));
        signups
            .expect_create()
            .withf(|e: &SignupEntry| {
                e.status == SignupStatus::WaitingForEmail
                    && e.email == "a@x.com"
                    && e.mac_address == "aa:bb:cc:dd:ee:ff"
                    && !e.id.is_empty()
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = SignupService::new(
            Arc::new(signups),
            Arc::new(operator_repo_with_acme()),
            Arc::new(identity_ok()),
        );

        let entry = service
            .signup(request("A@x.com", "AA:BB:CC:DD:EE:FF", false))
            .await
            .unwrap();
        assert_eq!(entry.status, SignupStatus::WaitingForEmail);
        assert_eq!(entry.user_id, "user-1");
    }

    #[tokio::test]
    async fn test_resend_reuses_existing_id() {
        let mut signups = MockSignupRepository::new();
        signups
            .expect_get_by_email()
            .returning(|_| Ok(Some(test_entry("sid-1", "a@x.com", "aa:bb:cc:dd:ee:ff"))));
        signups
            .expect_get_by_mac()
            .returning(|_| Ok(Some(test_entry("sid-1", "a@x.com", "aa:bb:cc:dd:ee:ff"))));
        signups
            .expect_update()
            .withf(|e: &SignupEntry| e.id == "sid-1")
            .times(1)
            .returning(|_| Ok(()));
        signups.expect_create().times(0);

        let service = SignupService::new(
            Arc::new(signups),
            Arc::new(operator_repo_with_acme()),
            Arc::new(identity_ok()),
        );

        let entry = service
            .signup(request("a@x.com", "aa:bb:cc:dd:ee:ff", true))
            .await
            .unwrap();
        assert_eq!(entry.id, "sid-1");
    }

    #[tokio::test]
    async fn test_email_bound_to_other_mac_rejected() {
        let mut signups = MockSignupRepository::new();
        signups
            .expect_get_by_email()
            .returning(|_| Ok(Some(test_entry("sid-1", "a@x.com", "aa:bb:cc:dd:ee:ff"))));
        signups.expect_get_by_mac().returning(|_| Ok(None));

        let service = SignupService::new(
            Arc::new(signups),
            Arc::new(operator_repo_with_acme()),
            Arc::new(MockIdentityClient::new()),
        );

        let result = service
            .signup(request("a@x.com", "11:22:33:44:55:66", false))
            .await;
        assert!(matches!(result, Err(DomainError::UserAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_mac_bound_to_other_email_rejected() {
        let mut signups = MockSignupRepository::new();
        signups.expect_get_by_email().returning(|_| Ok(None));
        signups
            .expect_get_by_mac()
            .returning(|_| Ok(Some(test_entry("sid-1", "a@x.com", "aa:bb:cc:dd:ee:ff"))));

        let service = SignupService::new(
            Arc::new(signups),
            Arc::new(operator_repo_with_acme()),
            Arc::new(MockIdentityClient::new()),
        );

        let result = service
            .signup(request("b@x.com", "aa:bb:cc:dd:ee:ff", false))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::SerialNumberAlreadyProvisioned(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_parameters_rejected() {
        let service = SignupService::new(
            Arc::new(MockSignupRepository::new()),
            Arc::new(MockOperatorRepository::new()),
            Arc::new(MockIdentityClient::new()),
        );

        let result = service.signup(request("", "aa:bb:cc:dd:ee:ff", false)).await;
        assert!(matches!(
            result,
            Err(DomainError::MissingOrInvalidParameters)
        ));

        let result = service
            .signup(request("not-an-email", "aa:bb:cc:dd:ee:ff", false))
            .await;
        assert!(matches!(result, Err(DomainError::InvalidEmailAddress(_))));

        let result = service.signup(request("a@x.com", "nothex", false)).await;
        assert!(matches!(result, Err(DomainError::InvalidSerialNumber(_))));
    }

    #[tokio::test]
    async fn test_unknown_operator_rejected() {
        let mut operators = MockOperatorRepository::new();
        operators
            .expect_get_by_registration_id()
            .returning(|_| Ok(None));

        let service = SignupService::new(
            Arc::new(MockSignupRepository::new()),
            Arc::new(operators),
            Arc::new(MockIdentityClient::new()),
        );

        let result = service
            .signup(request("a@x.com", "aa:bb:cc:dd:ee:ff", false))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::InvalidRegistrationOperator(_))
        ));
    }

    #[tokio::test]
    async fn test_identity_rejection_passes_through() {
        let mut signups = MockSignupRepository::new();
        signups.expect_get_by_email().returning(|_| Ok(None));
        signups.expect_get_by_mac().returning(|_| Ok(None));
        signups.expect_create().times(0);

        let mut identity = MockIdentityClient::new();
        identity.expect_create_or_resend_user().returning(|_| {
            Ok(RemoteResponse {
                status: 403,
                body: serde_json::json!({"ErrorDescription": "denied"}),
            })
        });

        let service = SignupService::new(
            Arc::new(signups),
            Arc::new(operator_repo_with_acme()),
            Arc::new(identity),
        );

        let result = service
            .signup(request("a@x.com", "aa:bb:cc:dd:ee:ff", false))
            .await;
        match result {
            Err(DomainError::RemoteRejected { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body["ErrorDescription"], "denied");
            }
            other => panic!("expected RemoteRejected, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_email_verified_transitions() {
        let mut signups = MockSignupRepository::new();
        signups
            .expect_get_by_id()
            .returning(|_| Ok(Some(test_entry("sid-1", "a@x.com", "aa:bb:cc:dd:ee:ff"))));
        signups
            .expect_update()
            .withf(|e: &SignupEntry| e.status == SignupStatus::WaitingForDevice)
            .times(1)
            .returning(|_| Ok(()));

        let service = SignupService::new(
            Arc::new(signups),
            Arc::new(MockOperatorRepository::new()),
            Arc::new(MockIdentityClient::new()),
        );

        let entry = service
            .email_verified(SignupKey::Id("sid-1".to_string()))
            .await
            .unwrap();
        assert_eq!(entry.status, SignupStatus::WaitingForDevice);
    }

    #[tokio::test]
    async fn test_email_verified_wrong_state_is_rejected() {
        let mut signups = MockSignupRepository::new();
        signups.expect_get_by_id().returning(|_| {
            let mut entry = test_entry("sid-1", "a@x.com", "aa:bb:cc:dd:ee:ff");
            entry.status = SignupStatus::WaitingForDevice;
            Ok(Some(entry))
        });
        signups.expect_update().times(0);

        let service = SignupService::new(
            Arc::new(signups),
            Arc::new(MockOperatorRepository::new()),
            Arc::new(MockIdentityClient::new()),
        );

        let result = service
            .email_verified(SignupKey::Id("sid-1".to_string()))
            .await;
        assert!(matches!(result, Err(DomainError::UnknownOperation)));
    }

    #[tokio::test]
    async fn test_update_mac_clears_binding() {
        let mut signups = MockSignupRepository::new();
        signups
            .expect_get_by_user_id()
            .returning(|_| Ok(Some(test_entry("sid-1", "a@x.com", "aa:bb:cc:dd:ee:ff"))));
        signups
            .expect_update()
            .withf(|e: &SignupEntry| e.mac_address.is_empty() && e.serial_number.is_empty())
            .times(1)
            .returning(|_| Ok(()));

        let service = SignupService::new(
            Arc::new(signups),
            Arc::new(MockOperatorRepository::new()),
            Arc::new(MockIdentityClient::new()),
        );

        let entry = service
            .update_mac(SignupKey::UserId("user-1".to_string()), "")
            .await
            .unwrap();
        assert!(entry.mac_address.is_empty());
    }
}
