use serde::{Deserialize, Serialize};

/// Local mirror of a remote group: one mapping per subscriber at any time.
/// The remote group is expected to exist whenever the mapping does, best
/// effort under crashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupsMapRecord {
    pub subscriber_id: String,
    pub group_id: i64,
}
