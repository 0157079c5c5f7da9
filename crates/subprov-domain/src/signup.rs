use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle states of a signup attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignupStatus {
    /// Credentials created, waiting for the subscriber to verify their email.
    WaitingForEmail,
    /// Email verified, waiting for the device to come online.
    WaitingForDevice,
}

impl SignupStatus {
    /// Wire representation carried in the stored record.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignupStatus::WaitingForEmail => "waiting-for-email-verification",
            SignupStatus::WaitingForDevice => "emailVerified",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "waiting-for-email-verification" => Some(SignupStatus::WaitingForEmail),
            "emailVerified" => Some(SignupStatus::WaitingForDevice),
            _ => None,
        }
    }
}

/// A subscriber's registration record, tracked from signup through email and
/// device verification. Never implicitly deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupEntry {
    pub id: String,
    pub email: String,
    pub serial_number: String,
    pub mac_address: String,
    pub device_id: String,
    pub registration_id: String,
    pub user_id: String,
    pub operator_id: String,
    pub status: SignupStatus,
    pub completed: bool,
    pub error: i64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub submitted: Option<DateTime<Utc>>,
}
