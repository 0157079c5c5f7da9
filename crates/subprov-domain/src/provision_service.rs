use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::clients::{AnalyticsClient, BoardVenue, OpenBoardRequest};
use crate::error::{DomainError, DomainResult};
use crate::repository::{
    EntityRepository, InventoryRepository, OperatorRepository, SignupRepository, VenueRepository,
};
use crate::signup::SignupEntry;
use crate::venue::Venue;

#[derive(Debug, Clone, Copy, Default)]
pub struct MonitoringOptions {
    pub retention: u64,
    pub interval: u64,
    pub monitor_sub_venues: bool,
}

#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub subscriber_id: String,
    pub enable_monitoring: bool,
    pub monitoring: MonitoringOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionSummary {
    pub board_id: String,
    pub entity_id: String,
    pub serial_number: String,
    pub subscriber_id: String,
    pub venue_id: String,
    pub venue_name: String,
}

/// Forward/reverse workflow binding a verified subscriber to a venue, a
/// device, and optionally a monitoring board.
///
/// The forward workflow is forward-only: a failing step aborts with its own
/// error and nothing already done is undone. The reverse workflow favors
/// idempotency, treating missing records during cleanup as already cleaned.
pub struct ProvisionService {
    signups: Arc<dyn SignupRepository>,
    operators: Arc<dyn OperatorRepository>,
    venues: Arc<dyn VenueRepository>,
    inventory: Arc<dyn InventoryRepository>,
    entities: Arc<dyn EntityRepository>,
    analytics: Arc<dyn AnalyticsClient>,
}

impl ProvisionService {
    pub fn new(
        signups: Arc<dyn SignupRepository>,
        operators: Arc<dyn OperatorRepository>,
        venues: Arc<dyn VenueRepository>,
        inventory: Arc<dyn InventoryRepository>,
        entities: Arc<dyn EntityRepository>,
        analytics: Arc<dyn AnalyticsClient>,
    ) -> Self {
        Self {
            signups,
            operators,
            venues,
            inventory,
            entities,
            analytics,
        }
    }

    pub async fn provision(&self, req: ProvisionRequest) -> DomainResult<ProvisionSummary> {
        if req.subscriber_id.is_empty() {
            return Err(DomainError::MissingOrInvalidParameters);
        }

        let signup = self.load_signup(&req.subscriber_id).await?;
        let venue_name = signup.email.clone();
        let entity_id = self.load_operator_entity(&signup).await?;

        info!(
            subscriber_id = %signup.user_id,
            entity_id = %entity_id,
            venue_name = %venue_name,
            "Provisioning subscriber"
        );

        let venue = self.create_venue(&venue_name, &entity_id).await?;
        let tag = self.link_inventory(&signup, &venue.id).await?;

        let mut board_id = String::new();
        if req.enable_monitoring {
            board_id = self
                .start_monitoring(&venue.id, &venue_name, req.monitoring)
                .await?;
        }

        Ok(ProvisionSummary {
            board_id,
            entity_id,
            serial_number: tag.serial_number,
            subscriber_id: signup.user_id,
            venue_id: venue.id,
            venue_name,
        })
    }

    pub async fn deprovision(&self, subscriber_id: &str) -> DomainResult<()> {
        if subscriber_id.is_empty() {
            return Err(DomainError::MissingOrInvalidParameters);
        }

        let signup = self.load_signup(subscriber_id).await?;
        self.load_operator_entity(&signup).await?;

        info!(subscriber_id = %signup.user_id, "Deprovisioning subscriber");

        let previous_venue_id = self.unlink_inventory(&signup).await?;

        let Some(venue_id) = previous_venue_id else {
            // Nothing was linked; already deprovisioned.
            return Ok(());
        };

        // Re-fetch the venue rather than trusting any in-memory copy; a
        // vanished venue counts as already cleaned up.
        let Some(venue) = self.venues.get(&venue_id).await? else {
            debug!(venue_id = %venue_id, "Venue already gone during deprovision");
            return Ok(());
        };

        let venue = self.stop_monitoring(venue).await?;
        self.delete_venue(venue).await?;
        Ok(())
    }

    async fn load_signup(&self, subscriber_id: &str) -> DomainResult<SignupEntry> {
        let signup = self
            .signups
            .get_by_user_id(subscriber_id)
            .await?
            .ok_or_else(|| {
                error!(subscriber_id = %subscriber_id, "Signup record not found");
                DomainError::NotFound(subscriber_id.to_string())
            })?;

        if signup.serial_number.is_empty()
            || signup.registration_id.is_empty()
            || signup.email.is_empty()
        {
            error!(
                subscriber_id = %subscriber_id,
                "Signup record is missing serial number, registration id, or email"
            );
            return Err(DomainError::MissingOrInvalidParameters);
        }
        Ok(signup)
    }

    async fn load_operator_entity(&self, signup: &SignupEntry) -> DomainResult<String> {
        let operator = self
            .operators
            .get_by_registration_id(&signup.registration_id)
            .await?
            .ok_or_else(|| {
                DomainError::InvalidRegistrationOperator(signup.registration_id.clone())
            })?;

        if operator.entity_id.is_empty() || !self.entities.exists(&operator.entity_id).await? {
            return Err(DomainError::EntityMustExist(operator.entity_id));
        }
        Ok(operator.entity_id)
    }

    async fn create_venue(&self, name: &str, entity_id: &str) -> DomainResult<Venue> {
        if self.venues.name_exists(name, entity_id).await? {
            return Err(DomainError::VenueNameAlreadyExists(name.to_string()));
        }

        let now = Utc::now();
        let venue = Venue {
            id: xid::new().to_string(),
            name: name.to_string(),
            entity_id: entity_id.to_string(),
            devices: Vec::new(),
            boards: Vec::new(),
            created: Some(now),
            modified: Some(now),
        };
        self.venues
            .create(venue.clone())
            .await
            .map_err(|_| DomainError::RecordNotCreated)?;

        // Register the back-reference in the owning entity.
        if let Some(mut entity) = self.entities.get(entity_id).await? {
            if !entity.venues.contains(&venue.id) {
                entity.venues.push(venue.id.clone());
                self.entities.update(entity).await?;
            }
        }

        debug!(venue_id = %venue.id, entity_id = %entity_id, "Venue created");
        Ok(venue)
    }

    async fn link_inventory(
        &self,
        signup: &SignupEntry,
        venue_id: &str,
    ) -> DomainResult<crate::inventory::InventoryTag> {
        let mut tag = self
            .inventory
            .get_by_serial(&signup.serial_number)
            .await?
            .ok_or_else(|| {
                error!(serial = %signup.serial_number, "Inventory device not found");
                DomainError::NotFound(signup.serial_number.clone())
            })?;

        tag.venue_id = venue_id.to_string();
        tag.modified = Some(Utc::now());
        self.inventory
            .update(tag.clone())
            .await
            .map_err(|_| DomainError::RecordNotUpdated)?;

        // Mirror the link on the venue side.
        if let Some(mut venue) = self.venues.get(venue_id).await? {
            if !venue.devices.contains(&tag.id) {
                venue.devices.push(tag.id.clone());
                venue.modified = Some(Utc::now());
                self.venues.update(venue).await?;
            }
        }

        info!(
            serial = %tag.serial_number,
            venue_id = %venue_id,
            subscriber_id = %signup.user_id,
            "Device linked to venue"
        );
        Ok(tag)
    }

    /// Clear the device's venue binding, returning the venue id it was linked
    /// to. `None` means there was nothing to unlink.
    async fn unlink_inventory(&self, signup: &SignupEntry) -> DomainResult<Option<String>> {
        let Some(mut tag) = self.inventory.get_by_serial(&signup.serial_number).await? else {
            debug!(serial = %signup.serial_number, "Inventory device not found, nothing to unlink");
            return Ok(None);
        };

        if !tag.is_linked() {
            debug!(serial = %signup.serial_number, "Device not linked to any venue");
            return Ok(None);
        }

        let previous_venue_id = std::mem::take(&mut tag.venue_id);
        tag.modified = Some(Utc::now());
        self.inventory
            .update(tag.clone())
            .await
            .map_err(|_| DomainError::RecordNotUpdated)?;

        if let Some(mut venue) = self.venues.get(&previous_venue_id).await? {
            venue.devices.retain(|d| d != &tag.id);
            venue.modified = Some(Utc::now());
            self.venues.update(venue).await?;
        }

        Ok(Some(previous_venue_id))
    }

    async fn start_monitoring(
        &self,
        venue_id: &str,
        venue_name: &str,
        opts: MonitoringOptions,
    ) -> DomainResult<String> {
        let answer = self
            .analytics
            .open_board(OpenBoardRequest {
                name: venue_name.to_string(),
                venue_list: vec![BoardVenue {
                    id: venue_id.to_string(),
                    name: venue_name.to_string(),
                    retention: opts.retention,
                    interval: opts.interval,
                    monitor_sub_venues: opts.monitor_sub_venues,
                }],
            })
            .await?;

        if !answer.is_success() {
            error!(venue_id = %venue_id, status = answer.status, "Failed to open monitoring board");
            return Err(DomainError::RemoteRejected {
                status: answer.status,
                body: answer.body,
            });
        }

        let board_id = answer
            .body
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        if board_id.is_empty() {
            error!(venue_id = %venue_id, "Monitoring started but no board id returned");
            return Err(DomainError::RecordNotCreated);
        }

        let mut venue = self
            .venues
            .get(venue_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(venue_id.to_string()))?;
        venue.boards.push(board_id.clone());
        venue.modified = Some(Utc::now());
        self.venues
            .update(venue)
            .await
            .map_err(|_| DomainError::RecordNotUpdated)?;

        info!(venue_id = %venue_id, board_id = %board_id, "Monitoring board opened");
        Ok(board_id)
    }

    /// Close every board attached to the venue, best effort, then clear the
    /// board list.
    async fn stop_monitoring(&self, mut venue: Venue) -> DomainResult<Venue> {
        if venue.boards.is_empty() {
            return Ok(venue);
        }

        for board_id in &venue.boards {
            match self.analytics.close_board(board_id).await {
                Ok(status) if (200..300).contains(&status) => {
                    debug!(board_id = %board_id, "Monitoring board closed");
                }
                Ok(status) => {
                    warn!(board_id = %board_id, status, "Failed to close monitoring board, continuing");
                }
                Err(e) => {
                    warn!(board_id = %board_id, error = %e, "Failed to close monitoring board, continuing");
                }
            }
        }

        venue.boards.clear();
        venue.modified = Some(Utc::now());
        self.venues
            .update(venue.clone())
            .await
            .map_err(|_| DomainError::RecordNotUpdated)?;
        Ok(venue)
    }

    async fn delete_venue(&self, venue: Venue) -> DomainResult<()> {
        if !self.venues.delete(&venue.id).await? {
            return Err(DomainError::RecordNotDeleted);
        }

        if let Some(mut entity) = self.entities.get(&venue.entity_id).await? {
            entity.venues.retain(|v| v != &venue.id);
            self.entities.update(entity).await?;
        }

        info!(venue_id = %venue.id, "Venue deleted");
        Ok(())
    }
}
