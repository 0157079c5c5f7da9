use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_nats::jetstream::{self, consumer::PullConsumer};
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use subprov_domain::{GroupReconciler, SubscriberEvent};

/// Durable JetStream pull consumer feeding the group reconciler.
///
/// Events are handled strictly one at a time, in delivery order. Every
/// delivered message is acked after handling: unparsable or unrecognized
/// events are drops, not retries, and reconciliation failures surface only
/// through logs. Cancellation is observed only while waiting for the next
/// message, so a message already in hand is always handled and acked to
/// completion before `run` returns; anything still in the stream is
/// redelivered on restart.
pub struct SubscriberEventConsumer {
    consumer: PullConsumer,
    reconciler: Arc<GroupReconciler>,
    batch_size: usize,
    max_wait: Duration,
}

impl SubscriberEventConsumer {
    pub async fn new(
        jetstream: &jetstream::Context,
        stream_name: &str,
        consumer_name: &str,
        subject_filter: &str,
        batch_size: usize,
        max_wait_secs: u64,
        reconciler: Arc<GroupReconciler>,
    ) -> Result<Self> {
        debug!(
            stream = stream_name,
            consumer = consumer_name,
            subject = subject_filter,
            "Creating subscriber-event consumer"
        );

        let consumer = jetstream
            .create_consumer_on_stream(
                jetstream::consumer::pull::Config {
                    name: Some(consumer_name.to_string()),
                    durable_name: Some(consumer_name.to_string()),
                    filter_subject: subject_filter.to_string(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
                stream_name,
            )
            .await
            .context("Failed to create consumer")?;

        info!(
            stream = stream_name,
            consumer = consumer_name,
            "Subscriber-event consumer created"
        );

        Ok(Self {
            consumer,
            reconciler,
            batch_size,
            max_wait: Duration::from_secs(max_wait_secs),
        })
    }

    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        info!("Starting subscriber-event loop");

        while !ctx.is_cancelled() {
            if let Err(e) = self.fetch_and_process_batch(&ctx).await {
                error!(error = %e, "Error processing event batch");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }

        info!("Subscriber-event loop stopped gracefully");
        Ok(())
    }

    async fn fetch_and_process_batch(&self, ctx: &CancellationToken) -> Result<()> {
        let mut messages = self
            .consumer
            .fetch()
            .max_messages(self.batch_size)
            .expires(self.max_wait)
            .messages()
            .await
            .context("Failed to fetch messages")?;

        // Shutdown is only checked between messages; once a message is in
        // hand it is dispatched and acked without racing the token.
        while let Some(result) = next_unless_cancelled(&mut messages, ctx).await {
            let msg = match result {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(error = %e, "Error receiving message from batch");
                    continue;
                }
            };

            dispatch_event(self.reconciler.as_ref(), &msg.payload, msg.subject.as_str()).await;

            // Acked unconditionally: drops are deliberate and reconciliation
            // failures are retried by later events, not redelivery.
            if let Err(e) = msg.ack().await {
                error!(error = %e, "Failed to acknowledge message");
            }
        }

        Ok(())
    }
}

/// Wait for the next item, yielding `None` once shutdown is signalled.
/// Biased toward cancellation so a cancelled worker stops at the next
/// message boundary instead of draining the rest of the batch.
async fn next_unless_cancelled<S>(messages: &mut S, ctx: &CancellationToken) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => None,
        next = messages.next() => next,
    }
}

async fn dispatch_event(reconciler: &GroupReconciler, payload: &[u8], subject: &str) {
    match SubscriberEvent::parse(payload) {
        Some(event) => {
            debug!(
                subscriber_id = %event.subscriber_id(),
                subject = %subject,
                "Handling subscriber event"
            );
            if let Err(e) = reconciler.handle_event(event).await {
                error!(error = %e, subject = %subject, "Failed to reconcile subscriber event");
            }
        }
        None => {
            warn!(subject = %subject, "Dropping unusable subscriber event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use subprov_domain::{DomainResult, GroupGatewayClient, GroupsMapRepository, InMemoryStore};
    use tokio::sync::Notify;

    const CREATE_BODY: &[u8] =
        br#"{"type":"infrastructure_subscriber_create","subscriberid":"sub-1"}"#;

    /// Group gateway stub whose create call parks until released, so a test
    /// can cancel the worker while the remote call is still in flight.
    struct GatedGroupGateway {
        entered: Arc<Notify>,
        release: Arc<Notify>,
        create_calls: AtomicUsize,
    }

    impl GatedGroupGateway {
        fn new() -> Self {
            Self {
                entered: Arc::new(Notify::new()),
                release: Arc::new(Notify::new()),
                create_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl GroupGatewayClient for GatedGroupGateway {
        async fn create_group(&self, _group_id: i64) -> DomainResult<bool> {
            self.entered.notify_one();
            self.release.notified().await;
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }

        async fn delete_group(&self, _group_id: i64) -> DomainResult<bool> {
            Ok(true)
        }

        async fn add_device_to_group(&self, _group_id: i64, _mac: &str) -> DomainResult<bool> {
            Ok(true)
        }

        async fn delete_device_from_group(
            &self,
            _group_id: i64,
            _mac: &str,
        ) -> DomainResult<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_cancellation_waits_for_event_in_flight() {
        let store = Arc::new(InMemoryStore::new());
        let cgw = Arc::new(GatedGroupGateway::new());
        let reconciler = Arc::new(GroupReconciler::new(store.clone(), cgw.clone()));

        let ctx = CancellationToken::new();
        let (tx, mut rx) = futures::channel::mpsc::unbounded::<Vec<u8>>();
        tx.unbounded_send(CREATE_BODY.to_vec()).unwrap();

        let worker = tokio::spawn({
            let reconciler = reconciler.clone();
            let ctx = ctx.clone();
            async move {
                while let Some(payload) = next_unless_cancelled(&mut rx, &ctx).await {
                    dispatch_event(reconciler.as_ref(), &payload, "subscriber_events.create")
                        .await;
                }
            }
        });

        // Cancel while the remote group create is mid-flight.
        cgw.entered.notified().await;
        ctx.cancel();
        cgw.release.notify_one();
        worker.await.unwrap();

        // The event in hand finished: remote call completed and the local
        // mapping agrees with it.
        assert_eq!(cgw.create_calls.load(Ordering::SeqCst), 1);
        assert!(GroupsMapRepository::exists(store.as_ref(), "sub-1")
            .await
            .unwrap());

        // Redelivery of the same event after restart stays a no-op.
        dispatch_event(reconciler.as_ref(), CREATE_BODY, "subscriber_events.create").await;
        assert_eq!(cgw.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_worker_stops_at_message_boundary() {
        let ctx = CancellationToken::new();
        ctx.cancel();

        let (tx, mut rx) = futures::channel::mpsc::unbounded::<Vec<u8>>();
        tx.unbounded_send(CREATE_BODY.to_vec()).unwrap();

        // A pending message is left for redelivery, not picked up.
        assert!(next_unless_cancelled(&mut rx, &ctx).await.is_none());
    }
}
