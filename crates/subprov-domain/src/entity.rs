use serde::{Deserialize, Serialize};

/// An owning entity with back-references to its venues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub venues: Vec<String>,
}
