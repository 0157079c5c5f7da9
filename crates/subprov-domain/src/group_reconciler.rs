use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clients::GroupGatewayClient;
use crate::error::DomainResult;
use crate::groups_map::GroupsMapRecord;
use crate::repository::GroupsMapRepository;
use crate::subscriber_event::SubscriberEvent;

/// Translates subscriber lifecycle events into remote group create/delete
/// calls plus the local id mapping.
///
/// Never surfaces an error to the event source: there is no waiting caller,
/// so every failure is a log line. `handle_event` only returns `Err` for
/// repository failures, which the consumer also just logs.
pub struct GroupReconciler {
    groups: Arc<dyn GroupsMapRepository>,
    cgw: Arc<dyn GroupGatewayClient>,
}

impl GroupReconciler {
    pub fn new(groups: Arc<dyn GroupsMapRepository>, cgw: Arc<dyn GroupGatewayClient>) -> Self {
        Self { groups, cgw }
    }

    pub async fn handle_event(&self, event: SubscriberEvent) -> DomainResult<()> {
        match event {
            SubscriberEvent::Create { subscriber_id } => self.handle_create(&subscriber_id).await,
            SubscriberEvent::Delete { subscriber_id } => self.handle_delete(&subscriber_id).await,
        }
    }

    async fn handle_create(&self, subscriber_id: &str) -> DomainResult<()> {
        if self.groups.exists(subscriber_id).await? {
            debug!(subscriber_id = %subscriber_id,
                "Subscriber already mapped, skipping group create");
            return Ok(());
        }

        // Race window under concurrent create events; acceptable for a
        // single-consumer worker.
        let group_id = self.groups.max_group_id().await? + 1;
        self.groups
            .create(GroupsMapRecord {
                subscriber_id: subscriber_id.to_string(),
                group_id,
            })
            .await?;
        info!(subscriber_id = %subscriber_id, group_id, "Created group mapping");

        let created = match self.cgw.create_group(group_id).await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(subscriber_id = %subscriber_id, group_id, error = %e,
                    "Group create call failed");
                false
            }
        };

        if !created {
            warn!(subscriber_id = %subscriber_id, group_id,
                "Remote group create failed, rolling back mapping");
            match self.groups.delete(subscriber_id).await {
                Ok(true) => {}
                Ok(false) | Err(_) => {
                    warn!(subscriber_id = %subscriber_id,
                        "Rollback failed: could not delete group mapping");
                }
            }
        }
        Ok(())
    }

    async fn handle_delete(&self, subscriber_id: &str) -> DomainResult<()> {
        let Some(record) = self.groups.get(subscriber_id).await? else {
            warn!(subscriber_id = %subscriber_id,
                "No group mapping found on delete event, skipping");
            return Ok(());
        };

        info!(subscriber_id = %subscriber_id, group_id = record.group_id,
            "Deleting remote group");

        let deleted = match self.cgw.delete_group(record.group_id).await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(subscriber_id = %subscriber_id, group_id = record.group_id, error = %e,
                    "Group delete call failed");
                false
            }
        };

        if deleted {
            // Only drop the mapping once the remote side is gone; a failed
            // delete keeps it so a later event can retry.
            if self.groups.delete(subscriber_id).await? {
                info!(subscriber_id = %subscriber_id, group_id = record.group_id,
                    "Deleted group mapping");
            } else {
                warn!(subscriber_id = %subscriber_id,
                    "Failed to delete group mapping after remote deletion");
            }
        } else {
            warn!(subscriber_id = %subscriber_id, group_id = record.group_id,
                "Remote group delete failed, keeping mapping for retry");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockGroupGatewayClient;
    use crate::in_memory_store::InMemoryStore;
    use crate::repository::MockGroupsMapRepository;

    fn create_event(id: &str) -> SubscriberEvent {
        SubscriberEvent::Create {
            subscriber_id: id.to_string(),
        }
    }

    fn delete_event(id: &str) -> SubscriberEvent {
        SubscriberEvent::Delete {
            subscriber_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_create_allocates_once() {
        let store = Arc::new(InMemoryStore::new());
        let mut cgw = MockGroupGatewayClient::new();
        cgw.expect_create_group()
            .withf(|group_id| *group_id == 1)
            .times(1)
            .returning(|_| Ok(true));

        let reconciler = GroupReconciler::new(store.clone(), Arc::new(cgw));
        reconciler.handle_event(create_event("sub-1")).await.unwrap();
        reconciler.handle_event(create_event("sub-1")).await.unwrap();

        let record = GroupsMapRepository::get(store.as_ref(), "sub-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.group_id, 1);
    }

    #[tokio::test]
    async fn test_group_ids_are_monotonic() {
        let store = Arc::new(InMemoryStore::new());
        let mut cgw = MockGroupGatewayClient::new();
        cgw.expect_create_group().times(2).returning(|_| Ok(true));

        let reconciler = GroupReconciler::new(store.clone(), Arc::new(cgw));
        reconciler.handle_event(create_event("sub-1")).await.unwrap();
        reconciler.handle_event(create_event("sub-2")).await.unwrap();

        let first = GroupsMapRepository::get(store.as_ref(), "sub-1")
            .await
            .unwrap()
            .unwrap();
        let second = GroupsMapRepository::get(store.as_ref(), "sub-2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.group_id, 1);
        assert_eq!(second.group_id, 2);
    }

    #[tokio::test]
    async fn test_create_failure_rolls_back_mapping() {
        let store = Arc::new(InMemoryStore::new());
        let mut cgw = MockGroupGatewayClient::new();
        cgw.expect_create_group().times(1).returning(|_| Ok(false));

        let reconciler = GroupReconciler::new(store.clone(), Arc::new(cgw));
        reconciler.handle_event(create_event("sub-1")).await.unwrap();

        assert!(!GroupsMapRepository::exists(store.as_ref(), "sub-1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delete_without_mapping_is_noop() {
        let mut groups = MockGroupsMapRepository::new();
        groups.expect_get().returning(|_| Ok(None));
        groups.expect_delete().times(0);
        let mut cgw = MockGroupGatewayClient::new();
        cgw.expect_delete_group().times(0);

        let reconciler = GroupReconciler::new(Arc::new(groups), Arc::new(cgw));
        reconciler.handle_event(delete_event("sub-1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_success_removes_mapping() {
        let store = Arc::new(InMemoryStore::new());
        GroupsMapRepository::create(
            store.as_ref(),
            GroupsMapRecord {
                subscriber_id: "sub-1".to_string(),
                group_id: 7,
            },
        )
        .await
        .unwrap();

        let mut cgw = MockGroupGatewayClient::new();
        cgw.expect_delete_group()
            .withf(|group_id| *group_id == 7)
            .times(1)
            .returning(|_| Ok(true));

        let reconciler = GroupReconciler::new(store.clone(), Arc::new(cgw));
        reconciler.handle_event(delete_event("sub-1")).await.unwrap();

        assert!(!GroupsMapRepository::exists(store.as_ref(), "sub-1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_mapping() {
        let store = Arc::new(InMemoryStore::new());
        GroupsMapRepository::create(
            store.as_ref(),
            GroupsMapRecord {
                subscriber_id: "sub-1".to_string(),
                group_id: 7,
            },
        )
        .await
        .unwrap();

        let mut cgw = MockGroupGatewayClient::new();
        cgw.expect_delete_group().times(1).returning(|_| Ok(false));

        let reconciler = GroupReconciler::new(store.clone(), Arc::new(cgw));
        reconciler.handle_event(delete_event("sub-1")).await.unwrap();

        assert!(GroupsMapRepository::exists(store.as_ref(), "sub-1")
            .await
            .unwrap());
    }
}
