use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A device record identified by serial number. An empty `venue_id` means the
/// device is not linked to any venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryTag {
    pub id: String,
    pub serial_number: String,
    pub venue_id: String,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl InventoryTag {
    pub fn is_linked(&self) -> bool {
        !self.venue_id.is_empty()
    }
}
