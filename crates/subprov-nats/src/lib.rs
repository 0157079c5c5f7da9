pub mod client;
pub mod subscriber_event_consumer;

pub use client::NatsClient;
pub use subscriber_event_consumer::SubscriberEventConsumer;
