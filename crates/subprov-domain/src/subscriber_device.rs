use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A device owned by a subscriber, joined to the subscriber's remote group by
/// MAC address and carrying the configuration last pushed to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriberDevice {
    pub id: String,
    pub subscriber_id: String,
    pub serial_number: String,
    pub configuration: serde_json::Value,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}
