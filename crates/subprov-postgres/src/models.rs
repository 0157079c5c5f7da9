use chrono::{DateTime, Utc};
use tokio_postgres::Row;

use subprov_domain::{
    Entity, GroupsMapRecord, InventoryTag, Operator, SignupEntry, SignupStatus, SubscriberDevice,
    Venue,
};

/// Row model for the `signups` table.
pub struct SignupRow {
    pub id: String,
    pub email: String,
    pub serial_number: String,
    pub mac_address: String,
    pub device_id: String,
    pub registration_id: String,
    pub user_id: String,
    pub operator_id: String,
    pub status: String,
    pub completed: bool,
    pub error: i64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub submitted: Option<DateTime<Utc>>,
}

impl SignupRow {
    pub const COLUMNS: &'static str = "id, email, serial_number, mac_address, device_id, \
         registration_id, user_id, operator_id, status, completed, error, created, modified, \
         submitted";

    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(0),
            email: row.get(1),
            serial_number: row.get(2),
            mac_address: row.get(3),
            device_id: row.get(4),
            registration_id: row.get(5),
            user_id: row.get(6),
            operator_id: row.get(7),
            status: row.get(8),
            completed: row.get(9),
            error: row.get(10),
            created: row.get(11),
            modified: row.get(12),
            submitted: row.get(13),
        }
    }
}

impl From<SignupRow> for SignupEntry {
    fn from(row: SignupRow) -> Self {
        SignupEntry {
            id: row.id,
            email: row.email,
            serial_number: row.serial_number,
            mac_address: row.mac_address,
            device_id: row.device_id,
            registration_id: row.registration_id,
            user_id: row.user_id,
            operator_id: row.operator_id,
            status: SignupStatus::from_str(&row.status).unwrap_or(SignupStatus::WaitingForEmail),
            completed: row.completed,
            error: row.error,
            created: row.created,
            modified: row.modified,
            submitted: row.submitted,
        }
    }
}

pub fn operator_from_row(row: &Row) -> Operator {
    Operator {
        id: row.get(0),
        registration_id: row.get(1),
        entity_id: row.get(2),
    }
}

/// Venues keep their device and board id lists as JSONB columns.
pub fn venue_from_row(row: &Row) -> Venue {
    let devices: serde_json::Value = row.get(3);
    let boards: serde_json::Value = row.get(4);
    Venue {
        id: row.get(0),
        name: row.get(1),
        entity_id: row.get(2),
        devices: string_list(devices),
        boards: string_list(boards),
        created: row.get(5),
        modified: row.get(6),
    }
}

pub fn inventory_from_row(row: &Row) -> InventoryTag {
    InventoryTag {
        id: row.get(0),
        serial_number: row.get(1),
        venue_id: row.get(2),
        created: row.get(3),
        modified: row.get(4),
    }
}

pub fn entity_from_row(row: &Row) -> Entity {
    let venues: serde_json::Value = row.get(1);
    Entity {
        id: row.get(0),
        venues: string_list(venues),
    }
}

pub fn groups_map_from_row(row: &Row) -> GroupsMapRecord {
    GroupsMapRecord {
        subscriber_id: row.get(0),
        group_id: row.get(1),
    }
}

pub fn subscriber_device_from_row(row: &Row) -> SubscriberDevice {
    SubscriberDevice {
        id: row.get(0),
        subscriber_id: row.get(1),
        serial_number: row.get(2),
        configuration: row.get(3),
        created: row.get(4),
        modified: row.get(5),
    }
}

pub fn string_list(value: serde_json::Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

pub fn json_list(values: &[String]) -> serde_json::Value {
    serde_json::json!(values)
}
