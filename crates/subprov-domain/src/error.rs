use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Missing or invalid parameters")]
    MissingOrInvalidParameters,

    #[error("Invalid email address: {0}")]
    InvalidEmailAddress(String),

    #[error("Invalid serial number: {0}")]
    InvalidSerialNumber(String),

    #[error("Invalid registration operator: {0}")]
    InvalidRegistrationOperator(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Serial number already provisioned: {0}")]
    SerialNumberAlreadyProvisioned(String),

    #[error("Entity must exist: {0}")]
    EntityMustExist(String),

    #[error("Venue name already exists: {0}")]
    VenueNameAlreadyExists(String),

    #[error("Subscriber has no group mapping: {0}")]
    InvalidSubscriberId(String),

    #[error("Unknown operation")]
    UnknownOperation,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Record not created")]
    RecordNotCreated,

    #[error("Record not updated")]
    RecordNotUpdated,

    #[error("Record not deleted")]
    RecordNotDeleted,

    /// A collaborator answered with a non-success status. The status and body
    /// are kept verbatim so callers can pass them through unchanged.
    #[error("Remote service rejected request with status {status}")]
    RemoteRejected {
        status: u16,
        body: serde_json::Value,
    },

    #[error("Remote call failed: {0}")]
    Remote(String),

    #[error("Repository error: {0}")]
    Repository(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
