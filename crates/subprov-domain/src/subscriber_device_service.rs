use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::clients::{DeviceGatewayClient, GroupGatewayClient};
use crate::error::{DomainError, DomainResult};
use crate::repository::{GroupsMapRepository, SubscriberDeviceRepository};
use crate::subscriber_device::SubscriberDevice;
use crate::validation;

#[derive(Debug, Clone)]
pub struct AddDeviceInput {
    pub subscriber_id: String,
    pub serial_number: String,
    pub configuration: serde_json::Value,
}

/// Manages subscriber devices: membership in the subscriber's remote group
/// and configuration pushes to the device gateway.
pub struct SubscriberDeviceService {
    devices: Arc<dyn SubscriberDeviceRepository>,
    groups: Arc<dyn GroupsMapRepository>,
    cgw: Arc<dyn GroupGatewayClient>,
    gateway: Arc<dyn DeviceGatewayClient>,
}

impl SubscriberDeviceService {
    pub fn new(
        devices: Arc<dyn SubscriberDeviceRepository>,
        groups: Arc<dyn GroupsMapRepository>,
        cgw: Arc<dyn GroupGatewayClient>,
        gateway: Arc<dyn DeviceGatewayClient>,
    ) -> Self {
        Self {
            devices,
            groups,
            cgw,
            gateway,
        }
    }

    /// Add a device to a subscriber, joining its MAC to the subscriber's
    /// remote group before persisting. A subscriber without a group mapping
    /// is rejected.
    pub async fn add_device(&self, input: AddDeviceInput) -> DomainResult<SubscriberDevice> {
        if input.subscriber_id.is_empty() {
            return Err(DomainError::MissingOrInvalidParameters);
        }
        let serial = validation::normalize(&input.serial_number);
        if !validation::valid_serial_number(&serial) {
            return Err(DomainError::InvalidSerialNumber(serial));
        }

        let group_id = self.resolve_group(&input.subscriber_id).await?;
        let mac = validation::serial_to_mac(&serial);

        if !self.cgw.add_device_to_group(group_id, &mac).await? {
            error!(group_id, mac = %mac, "Failed to add device to remote group");
            return Err(DomainError::Remote(format!(
                "add device {mac} to group {group_id} failed"
            )));
        }

        let now = Utc::now();
        let device = SubscriberDevice {
            id: xid::new().to_string(),
            subscriber_id: input.subscriber_id,
            serial_number: serial,
            configuration: input.configuration,
            created: Some(now),
            modified: Some(now),
        };
        self.devices.create(device.clone()).await?;

        info!(device_id = %device.id, subscriber_id = %device.subscriber_id,
            "Subscriber device added");
        Ok(device)
    }

    /// Remove a device, leaving the subscriber's remote group first. The
    /// local record is only deleted once the remote side succeeded.
    pub async fn remove_device(&self, id: &str) -> DomainResult<()> {
        let device = self
            .devices
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))?;

        let group_id = self.resolve_group(&device.subscriber_id).await?;
        let mac = validation::serial_to_mac(&device.serial_number);

        if !self.cgw.delete_device_from_group(group_id, &mac).await? {
            error!(group_id, mac = %mac, "Failed to remove device from remote group");
            return Err(DomainError::Remote(format!(
                "delete device {mac} from group {group_id} failed"
            )));
        }

        if !self.devices.delete(id).await? {
            return Err(DomainError::RecordNotDeleted);
        }
        info!(device_id = %id, "Subscriber device removed");
        Ok(())
    }

    /// Persist a new configuration and push it to the device.
    pub async fn update_configuration(
        &self,
        id: &str,
        configuration: serde_json::Value,
    ) -> DomainResult<SubscriberDevice> {
        let mut device = self
            .devices
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))?;

        device.configuration = configuration.clone();
        device.modified = Some(Utc::now());
        self.devices.update(device.clone()).await?;

        debug!(serial = %device.serial_number, "Pushing configuration");
        if !self
            .gateway
            .push_configuration(&device.serial_number, configuration)
            .await?
        {
            error!(serial = %device.serial_number, "Configuration push failed");
            return Err(DomainError::Remote(format!(
                "configuration push to {} failed",
                device.serial_number
            )));
        }

        Ok(device)
    }

    pub async fn get_device(&self, key: &str) -> DomainResult<SubscriberDevice> {
        let found = if validation::valid_serial_number(key) {
            self.devices.get_by_serial(&validation::normalize(key)).await?
        } else {
            self.devices.get(key).await?
        };
        found.ok_or_else(|| DomainError::NotFound(key.to_string()))
    }

    async fn resolve_group(&self, subscriber_id: &str) -> DomainResult<i64> {
        let record = self.groups.get(subscriber_id).await?.ok_or_else(|| {
            error!(subscriber_id = %subscriber_id, "Subscriber has no group mapping");
            DomainError::InvalidSubscriberId(subscriber_id.to_string())
        })?;
        Ok(record.group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockDeviceGatewayClient, MockGroupGatewayClient};
    use crate::groups_map::GroupsMapRecord;
    use crate::repository::{MockGroupsMapRepository, MockSubscriberDeviceRepository};

    fn groups_with_mapping(group_id: i64) -> MockGroupsMapRepository {
        let mut groups = MockGroupsMapRepository::new();
        groups.expect_get().returning(move |subscriber_id| {
            Ok(Some(GroupsMapRecord {
                subscriber_id: subscriber_id.to_string(),
                group_id,
            }))
        });
        groups
    }

    fn test_device(id: &str) -> SubscriberDevice {
        SubscriberDevice {
            id: id.to_string(),
            subscriber_id: "sub-1".to_string(),
            serial_number: "aabbccddeeff".to_string(),
            configuration: serde_json::json!({}),
            created: Some(Utc::now()),
            modified: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_add_device_joins_group() {
        let mut devices = MockSubscriberDeviceRepository::new();
        devices.expect_create().times(1).returning(|_| Ok(()));

        let mut cgw = MockGroupGatewayClient::new();
        cgw.expect_add_device_to_group()
            .withf(|group_id, mac| *group_id == 5 && mac == "aa:bb:cc:dd:ee:ff")
            .times(1)
            .returning(|_, _| Ok(true));

        let service = SubscriberDeviceService::new(
            Arc::new(devices),
            Arc::new(groups_with_mapping(5)),
            Arc::new(cgw),
            Arc::new(MockDeviceGatewayClient::new()),
        );

        let device = service
            .add_device(AddDeviceInput {
                subscriber_id: "sub-1".to_string(),
                serial_number: "AA:BB:CC:DD:EE:FF".to_string(),
                configuration: serde_json::json!({"ssid": "home"}),
            })
            .await
            .unwrap();
        assert_eq!(device.serial_number, "aa:bb:cc:dd:ee:ff");
    }

    #[tokio::test]
    async fn test_add_device_unmapped_subscriber_rejected() {
        let mut groups = MockGroupsMapRepository::new();
        groups.expect_get().returning(|_| Ok(None));
        let mut devices = MockSubscriberDeviceRepository::new();
        devices.expect_create().times(0);

        let service = SubscriberDeviceService::new(
            Arc::new(devices),
            Arc::new(groups),
            Arc::new(MockGroupGatewayClient::new()),
            Arc::new(MockDeviceGatewayClient::new()),
        );

        let result = service
            .add_device(AddDeviceInput {
                subscriber_id: "sub-1".to_string(),
                serial_number: "aabbccddeeff".to_string(),
                configuration: serde_json::json!({}),
            })
            .await;
        assert!(matches!(result, Err(DomainError::InvalidSubscriberId(_))));
    }

    #[tokio::test]
    async fn test_remove_device_leaves_group_first() {
        let mut devices = MockSubscriberDeviceRepository::new();
        devices
            .expect_get()
            .returning(|_| Ok(Some(test_device("dev-1"))));
        devices.expect_delete().times(1).returning(|_| Ok(true));

        let mut cgw = MockGroupGatewayClient::new();
        cgw.expect_delete_device_from_group()
            .withf(|group_id, mac| *group_id == 5 && mac == "aa:bb:cc:dd:ee:ff")
            .times(1)
            .returning(|_, _| Ok(true));

        let service = SubscriberDeviceService::new(
            Arc::new(devices),
            Arc::new(groups_with_mapping(5)),
            Arc::new(cgw),
            Arc::new(MockDeviceGatewayClient::new()),
        );

        service.remove_device("dev-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_device_remote_failure_keeps_record() {
        let mut devices = MockSubscriberDeviceRepository::new();
        devices
            .expect_get()
            .returning(|_| Ok(Some(test_device("dev-1"))));
        devices.expect_delete().times(0);

        let mut cgw = MockGroupGatewayClient::new();
        cgw.expect_delete_device_from_group()
            .times(1)
            .returning(|_, _| Ok(false));

        let service = SubscriberDeviceService::new(
            Arc::new(devices),
            Arc::new(groups_with_mapping(5)),
            Arc::new(cgw),
            Arc::new(MockDeviceGatewayClient::new()),
        );

        let result = service.remove_device("dev-1").await;
        assert!(matches!(result, Err(DomainError::Remote(_))));
    }

    #[tokio::test]
    async fn test_update_configuration_pushes() {
        let mut devices = MockSubscriberDeviceRepository::new();
        devices
            .expect_get()
            .returning(|_| Ok(Some(test_device("dev-1"))));
        devices.expect_update().times(1).returning(|_| Ok(()));

        let mut gateway = MockDeviceGatewayClient::new();
        gateway
            .expect_push_configuration()
            .withf(|serial, _| serial == "aabbccddeeff")
            .times(1)
            .returning(|_, _| Ok(true));

        let service = SubscriberDeviceService::new(
            Arc::new(devices),
            Arc::new(MockGroupsMapRepository::new()),
            Arc::new(MockGroupGatewayClient::new()),
            Arc::new(gateway),
        );

        let device = service
            .update_configuration("dev-1", serde_json::json!({"ssid": "new"}))
            .await
            .unwrap();
        assert_eq!(device.configuration["ssid"], "new");
    }
}
