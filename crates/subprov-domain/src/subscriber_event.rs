use tracing::debug;

const TYPE_CREATE: &str = "infrastructure_subscriber_create";
const TYPE_DELETE: &str = "infrastructure_subscriber_delete";

/// A subscriber lifecycle event pulled off the event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriberEvent {
    Create { subscriber_id: String },
    Delete { subscriber_id: String },
}

impl SubscriberEvent {
    /// Parse an event body. The object may wrap the real event under a
    /// `payload` field; `type` and `subscriberid` are read from whichever
    /// level holds them. Anything malformed, unknown, or missing its
    /// subscriber id yields `None` and is dropped by the caller.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let root: serde_json::Value = match serde_json::from_slice(payload) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "Unparsable subscriber event body");
                return None;
            }
        };

        let obj = match root.get("payload") {
            Some(inner) if inner.is_object() => inner,
            _ => &root,
        };

        let event_type = obj.get("type").and_then(|v| v.as_str()).unwrap_or_default();
        let subscriber_id = obj
            .get("subscriberid")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        if subscriber_id.is_empty() {
            debug!("Subscriber event without subscriber id, dropping");
            return None;
        }

        match event_type {
            TYPE_CREATE => Some(SubscriberEvent::Create { subscriber_id }),
            TYPE_DELETE => Some(SubscriberEvent::Delete { subscriber_id }),
            other => {
                debug!(event_type = %other, "Unrecognized subscriber event type, dropping");
                None
            }
        }
    }

    pub fn subscriber_id(&self) -> &str {
        match self {
            SubscriberEvent::Create { subscriber_id } => subscriber_id,
            SubscriberEvent::Delete { subscriber_id } => subscriber_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_event() {
        let body = br#"{"type":"infrastructure_subscriber_create","subscriberid":"sub-1"}"#;
        assert_eq!(
            SubscriberEvent::parse(body),
            Some(SubscriberEvent::Create {
                subscriber_id: "sub-1".to_string()
            })
        );
    }

    #[test]
    fn test_parse_delete_event_in_envelope() {
        let body =
            br#"{"payload":{"type":"infrastructure_subscriber_delete","subscriberid":"sub-2"}}"#;
        assert_eq!(
            SubscriberEvent::parse(body),
            Some(SubscriberEvent::Delete {
                subscriber_id: "sub-2".to_string()
            })
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(SubscriberEvent::parse(b"not json"), None);
        assert_eq!(
            SubscriberEvent::parse(br#"{"type":"unknown","subscriberid":"sub-1"}"#),
            None
        );
        assert_eq!(
            SubscriberEvent::parse(br#"{"type":"infrastructure_subscriber_create"}"#),
            None
        );
        assert_eq!(
            SubscriberEvent::parse(
                br#"{"type":"infrastructure_subscriber_create","subscriberid":""}"#
            ),
            None
        );
    }

    #[test]
    fn test_parse_non_object_payload_falls_back_to_root() {
        let body = br#"{"payload":"opaque","type":"infrastructure_subscriber_create","subscriberid":"sub-3"}"#;
        assert_eq!(
            SubscriberEvent::parse(body),
            Some(SubscriberEvent::Create {
                subscriber_id: "sub-3".to_string()
            })
        );
    }
}
