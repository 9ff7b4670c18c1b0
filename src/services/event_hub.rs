use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::message::Message;
use crate::models::verification::VerificationRequest;
use crate::models::withdrawal::WithdrawalRequest;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum MarketEvent {
    MessageCreated {
        message: Message,
    },
    MessageModerated {
        message: Message,
    },
    MessagesRead {
        reader_id: Uuid,
        partner_id: Uuid,
        count: u64,
    },
    WithdrawalUpdated {
        request: WithdrawalRequest,
    },
    VerificationReviewed {
        request: VerificationRequest,
    },
}

impl MarketEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MarketEvent::MessageCreated { .. } => "message_created",
            MarketEvent::MessageModerated { .. } => "message_moderated",
            MarketEvent::MessagesRead { .. } => "messages_read",
            MarketEvent::WithdrawalUpdated { .. } => "withdrawal_updated",
            MarketEvent::VerificationReviewed { .. } => "verification_reviewed",
        }
    }

    pub fn is_visible_to(&self, user_id: Uuid, is_admin: bool) -> bool {
        match self {
            MarketEvent::MessageCreated { message } | MarketEvent::MessageModerated { message } => {
                is_admin || message.involves(user_id)
            }
            MarketEvent::MessagesRead { partner_id, .. } => *partner_id == user_id,
            MarketEvent::WithdrawalUpdated { request } => is_admin || request.user_id == user_id,
            MarketEvent::VerificationReviewed { request } => {
                is_admin || request.user_id == user_id
            }
        }
    }
}

/// In-process fan-out of domain events to connected event streams.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<MarketEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(16));
        Self { tx }
    }

    pub fn publish(&self, event: MarketEvent) {
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => tracing::debug!(event = name, receivers, "event published"),
            Err(_) => tracing::trace!(event = name, "event dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(sender: Uuid, receiver: Uuid) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id: sender,
            receiver_id: receiver,
            content: "hi".into(),
            is_read: false,
            created_at: Utc::now(),
            is_flagged: false,
            supervised_by: None,
            supervisor_notes: None,
            media_url: None,
            media_type: None,
        }
    }

    #[test]
    fn message_events_reach_participants_and_admins_only() {
        let (a, b, stranger) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let event = MarketEvent::MessageCreated {
            message: message(a, b),
        };
        assert!(event.is_visible_to(a, false));
        assert!(event.is_visible_to(b, false));
        assert!(!event.is_visible_to(stranger, false));
        assert!(event.is_visible_to(stranger, true));
    }

    #[test]
    fn read_receipts_go_to_the_partner() {
        let (reader, partner) = (Uuid::new_v4(), Uuid::new_v4());
        let event = MarketEvent::MessagesRead {
            reader_id: reader,
            partner_id: partner,
            count: 3,
        };
        assert!(event.is_visible_to(partner, false));
        assert!(!event.is_visible_to(reader, false));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "messages_read");
        assert_eq!(json["readerId"], reader.to_string());
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let hub = EventHub::new(16);
        let mut rx = hub.subscribe();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        hub.publish(MarketEvent::MessageCreated {
            message: message(a, b),
        });
        let received = rx.recv().await.unwrap();
        assert_eq!(received.name(), "message_created");
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let hub = EventHub::new(16);
        hub.publish(MarketEvent::MessagesRead {
            reader_id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            count: 0,
        });
    }
}
