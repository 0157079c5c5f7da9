pub mod client;
pub mod entity_repository;
pub mod groups_map_repository;
pub mod inventory_repository;
pub mod models;
pub mod operator_repository;
pub mod signup_repository;
pub mod subscriber_device_repository;
pub mod venue_repository;

pub use client::PostgresClient;
pub use entity_repository::PostgresEntityRepository;
pub use groups_map_repository::PostgresGroupsMapRepository;
pub use inventory_repository::PostgresInventoryRepository;
pub use operator_repository::PostgresOperatorRepository;
pub use signup_repository::PostgresSignupRepository;
pub use subscriber_device_repository::PostgresSubscriberDeviceRepository;
pub use venue_repository::PostgresVenueRepository;
