use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::entity::Entity;
use crate::error::DomainResult;
use crate::groups_map::GroupsMapRecord;
use crate::inventory::InventoryTag;
use crate::operator::Operator;
use crate::repository::{
    EntityRepository, GroupsMapRepository, InventoryRepository, OperatorRepository,
    SignupRepository, SubscriberDeviceRepository, VenueRepository,
};
use crate::signup::SignupEntry;
use crate::subscriber_device::SubscriberDevice;
use crate::venue::Venue;

/// In-memory record store implementing every repository trait, keyed by
/// record id with linear scans for the secondary indexes. Used by workflow
/// tests and local development runs.
#[derive(Default)]
pub struct InMemoryStore {
    signups: Arc<RwLock<HashMap<String, SignupEntry>>>,
    operators: Arc<RwLock<HashMap<String, Operator>>>,
    venues: Arc<RwLock<HashMap<String, Venue>>>,
    inventory: Arc<RwLock<HashMap<String, InventoryTag>>>,
    entities: Arc<RwLock<HashMap<String, Entity>>>,
    groups: Arc<RwLock<HashMap<String, GroupsMapRecord>>>,
    devices: Arc<RwLock<HashMap<String, SubscriberDevice>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_operator(&self, operator: Operator) {
        self.operators
            .write()
            .await
            .insert(operator.id.clone(), operator);
    }

    pub async fn insert_entity(&self, entity: Entity) {
        self.entities.write().await.insert(entity.id.clone(), entity);
    }

    pub async fn insert_inventory(&self, tag: InventoryTag) {
        self.inventory.write().await.insert(tag.id.clone(), tag);
    }

    pub async fn insert_signup(&self, entry: SignupEntry) {
        self.signups.write().await.insert(entry.id.clone(), entry);
    }

    pub async fn venue_count(&self) -> usize {
        self.venues.read().await.len()
    }
}

#[async_trait]
impl SignupRepository for InMemoryStore {
    async fn create(&self, entry: SignupEntry) -> DomainResult<()> {
        self.signups.write().await.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn update(&self, entry: SignupEntry) -> DomainResult<()> {
        self.signups.write().await.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> DomainResult<Option<SignupEntry>> {
        Ok(self.signups.read().await.get(id).cloned())
    }

    async fn get_by_user_id(&self, user_id: &str) -> DomainResult<Option<SignupEntry>> {
        let signups = self.signups.read().await;
        Ok(signups.values().find(|e| e.user_id == user_id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> DomainResult<Option<SignupEntry>> {
        let signups = self.signups.read().await;
        Ok(signups.values().find(|e| e.email == email).cloned())
    }

    async fn get_by_mac(&self, mac: &str) -> DomainResult<Option<SignupEntry>> {
        let signups = self.signups.read().await;
        Ok(signups.values().find(|e| e.mac_address == mac).cloned())
    }

    async fn list_by_email(&self, email: &str, limit: usize) -> DomainResult<Vec<SignupEntry>> {
        let signups = self.signups.read().await;
        Ok(signups
            .values()
            .filter(|e| e.email == email)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_by_mac(&self, mac: &str, limit: usize) -> DomainResult<Vec<SignupEntry>> {
        let signups = self.signups.read().await;
        Ok(signups
            .values()
            .filter(|e| e.mac_address == mac)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list(&self, offset: usize, limit: usize) -> DomainResult<Vec<SignupEntry>> {
        let signups = self.signups.read().await;
        Ok(signups.values().skip(offset).take(limit).cloned().collect())
    }

    async fn delete_by_id(&self, id: &str) -> DomainResult<bool> {
        Ok(self.signups.write().await.remove(id).is_some())
    }

    async fn delete_by_email(&self, email: &str) -> DomainResult<bool> {
        let mut signups = self.signups.write().await;
        let before = signups.len();
        signups.retain(|_, e| e.email != email);
        Ok(signups.len() < before)
    }

    async fn delete_by_serial(&self, serial: &str) -> DomainResult<bool> {
        let mut signups = self.signups.write().await;
        let before = signups.len();
        signups.retain(|_, e| e.serial_number != serial);
        Ok(signups.len() < before)
    }
}

#[async_trait]
impl OperatorRepository for InMemoryStore {
    async fn get_by_registration_id(
        &self,
        registration_id: &str,
    ) -> DomainResult<Option<Operator>> {
        let operators = self.operators.read().await;
        Ok(operators
            .values()
            .find(|o| o.registration_id == registration_id)
            .cloned())
    }
}

#[async_trait]
impl VenueRepository for InMemoryStore {
    async fn create(&self, venue: Venue) -> DomainResult<()> {
        self.venues.write().await.insert(venue.id.clone(), venue);
        Ok(())
    }

    async fn update(&self, venue: Venue) -> DomainResult<()> {
        self.venues.write().await.insert(venue.id.clone(), venue);
        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Venue>> {
        Ok(self.venues.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        Ok(self.venues.write().await.remove(id).is_some())
    }

    async fn name_exists(&self, name: &str, entity_id: &str) -> DomainResult<bool> {
        let venues = self.venues.read().await;
        Ok(venues
            .values()
            .any(|v| v.name == name && v.entity_id == entity_id))
    }
}

#[async_trait]
impl InventoryRepository for InMemoryStore {
    async fn get_by_serial(&self, serial: &str) -> DomainResult<Option<InventoryTag>> {
        let inventory = self.inventory.read().await;
        Ok(inventory
            .values()
            .find(|t| t.serial_number == serial)
            .cloned())
    }

    async fn update(&self, tag: InventoryTag) -> DomainResult<()> {
        self.inventory.write().await.insert(tag.id.clone(), tag);
        Ok(())
    }
}

#[async_trait]
impl EntityRepository for InMemoryStore {
    async fn get(&self, id: &str) -> DomainResult<Option<Entity>> {
        Ok(self.entities.read().await.get(id).cloned())
    }

    async fn update(&self, entity: Entity) -> DomainResult<()> {
        self.entities.write().await.insert(entity.id.clone(), entity);
        Ok(())
    }

    async fn exists(&self, id: &str) -> DomainResult<bool> {
        Ok(self.entities.read().await.contains_key(id))
    }
}

#[async_trait]
impl GroupsMapRepository for InMemoryStore {
    async fn get(&self, subscriber_id: &str) -> DomainResult<Option<GroupsMapRecord>> {
        Ok(self.groups.read().await.get(subscriber_id).cloned())
    }

    async fn exists(&self, subscriber_id: &str) -> DomainResult<bool> {
        Ok(self.groups.read().await.contains_key(subscriber_id))
    }

    async fn create(&self, record: GroupsMapRecord) -> DomainResult<()> {
        self.groups
            .write()
            .await
            .insert(record.subscriber_id.clone(), record);
        Ok(())
    }

    async fn delete(&self, subscriber_id: &str) -> DomainResult<bool> {
        Ok(self.groups.write().await.remove(subscriber_id).is_some())
    }

    async fn max_group_id(&self) -> DomainResult<i64> {
        let groups = self.groups.read().await;
        Ok(groups.values().map(|r| r.group_id).max().unwrap_or(0))
    }
}

#[async_trait]
impl SubscriberDeviceRepository for InMemoryStore {
    async fn create(&self, device: SubscriberDevice) -> DomainResult<()> {
        self.devices.write().await.insert(device.id.clone(), device);
        Ok(())
    }

    async fn update(&self, device: SubscriberDevice) -> DomainResult<()> {
        self.devices.write().await.insert(device.id.clone(), device);
        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<SubscriberDevice>> {
        Ok(self.devices.read().await.get(id).cloned())
    }

    async fn get_by_serial(&self, serial: &str) -> DomainResult<Option<SubscriberDevice>> {
        let devices = self.devices.read().await;
        Ok(devices
            .values()
            .find(|d| d.serial_number == serial)
            .cloned())
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        Ok(self.devices.write().await.remove(id).is_some())
    }
}
