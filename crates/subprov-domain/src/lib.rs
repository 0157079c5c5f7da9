pub mod clients;
pub mod entity;
pub mod error;
pub mod group_reconciler;
pub mod groups_map;
pub mod in_memory_store;
pub mod inventory;
pub mod operator;
pub mod provision_service;
pub mod repository;
pub mod signup;
pub mod signup_service;
pub mod subscriber_device;
pub mod subscriber_device_service;
pub mod subscriber_event;
pub mod validation;
pub mod venue;

pub use clients::{
    AnalyticsClient, BoardVenue, DeviceGatewayClient, GroupGatewayClient, IdentityClient,
    OpenBoardRequest, RemoteResponse, SignupUserRequest,
};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use group_reconciler::GroupReconciler;
pub use groups_map::GroupsMapRecord;
pub use in_memory_store::InMemoryStore;
pub use inventory::InventoryTag;
pub use operator::Operator;
pub use provision_service::{
    MonitoringOptions, ProvisionRequest, ProvisionService, ProvisionSummary,
};
pub use repository::{
    EntityRepository, GroupsMapRepository, InventoryRepository, OperatorRepository,
    SignupRepository, SubscriberDeviceRepository, VenueRepository,
};
pub use signup::{SignupEntry, SignupStatus};
pub use signup_service::{SignupKey, SignupRequest, SignupService};
pub use subscriber_device::SubscriberDevice;
pub use subscriber_device_service::{AddDeviceInput, SubscriberDeviceService};
pub use subscriber_event::SubscriberEvent;
pub use venue::Venue;
