use serde::{Deserialize, Serialize};

/// An operator resolved by its registration identifier. Read-only from the
/// provisioning layer's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub id: String,
    pub registration_id: String,
    pub entity_id: String,
}
