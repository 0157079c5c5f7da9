use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logical site grouping devices and monitoring boards, owned by an entity.
///
/// `devices` must mirror the `venue_id` field of the listed inventory tags,
/// and the venue's id must appear in the owning entity's `venues` list. Both
/// sides are updated together by the provisioning workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub entity_id: String,
    pub devices: Vec<String>,
    pub boards: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}
