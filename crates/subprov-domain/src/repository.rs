use async_trait::async_trait;

use crate::entity::Entity;
use crate::error::DomainResult;
use crate::groups_map::GroupsMapRecord;
use crate::inventory::InventoryTag;
use crate::operator::Operator;
use crate::signup::SignupEntry;
use crate::subscriber_device::SubscriberDevice;
use crate::venue::Venue;

/// Storage operations for signup entries. Infrastructure crates implement
/// these traits; "absent" is expressed as `Ok(None)` / `Ok(false)` and mapped
/// to taxonomy errors by the services.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignupRepository: Send + Sync {
    async fn create(&self, entry: SignupEntry) -> DomainResult<()>;
    async fn update(&self, entry: SignupEntry) -> DomainResult<()>;
    async fn get_by_id(&self, id: &str) -> DomainResult<Option<SignupEntry>>;
    async fn get_by_user_id(&self, user_id: &str) -> DomainResult<Option<SignupEntry>>;
    async fn get_by_email(&self, email: &str) -> DomainResult<Option<SignupEntry>>;
    async fn get_by_mac(&self, mac: &str) -> DomainResult<Option<SignupEntry>>;
    async fn list_by_email(&self, email: &str, limit: usize) -> DomainResult<Vec<SignupEntry>>;
    async fn list_by_mac(&self, mac: &str, limit: usize) -> DomainResult<Vec<SignupEntry>>;
    async fn list(&self, offset: usize, limit: usize) -> DomainResult<Vec<SignupEntry>>;
    async fn delete_by_id(&self, id: &str) -> DomainResult<bool>;
    async fn delete_by_email(&self, email: &str) -> DomainResult<bool>;
    async fn delete_by_serial(&self, serial: &str) -> DomainResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OperatorRepository: Send + Sync {
    async fn get_by_registration_id(&self, registration_id: &str)
        -> DomainResult<Option<Operator>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn create(&self, venue: Venue) -> DomainResult<()>;
    async fn update(&self, venue: Venue) -> DomainResult<()>;
    async fn get(&self, id: &str) -> DomainResult<Option<Venue>>;
    async fn delete(&self, id: &str) -> DomainResult<bool>;
    /// True when a venue with this name already exists under the entity.
    async fn name_exists(&self, name: &str, entity_id: &str) -> DomainResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn get_by_serial(&self, serial: &str) -> DomainResult<Option<InventoryTag>>;
    async fn update(&self, tag: InventoryTag) -> DomainResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityRepository: Send + Sync {
    async fn get(&self, id: &str) -> DomainResult<Option<Entity>>;
    async fn update(&self, entity: Entity) -> DomainResult<()>;
    async fn exists(&self, id: &str) -> DomainResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupsMapRepository: Send + Sync {
    async fn get(&self, subscriber_id: &str) -> DomainResult<Option<GroupsMapRecord>>;
    async fn exists(&self, subscriber_id: &str) -> DomainResult<bool>;
    async fn create(&self, record: GroupsMapRecord) -> DomainResult<()>;
    async fn delete(&self, subscriber_id: &str) -> DomainResult<bool>;
    /// Highest group id currently allocated, 0 when the table is empty.
    async fn max_group_id(&self) -> DomainResult<i64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriberDeviceRepository: Send + Sync {
    async fn create(&self, device: SubscriberDevice) -> DomainResult<()>;
    async fn update(&self, device: SubscriberDevice) -> DomainResult<()>;
    async fn get(&self, id: &str) -> DomainResult<Option<SubscriberDevice>>;
    async fn get_by_serial(&self, serial: &str) -> DomainResult<Option<SubscriberDevice>>;
    async fn delete(&self, id: &str) -> DomainResult<bool>;
}
