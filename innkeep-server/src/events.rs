//! In-process fan-out of new support chat messages
//!
//! `send_message` publishes every stored message here; event-stream
//! subscribers receive the ones for the request they are watching.

use std::sync::Arc;

use futures::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::db::repos::MessageWithAuthor;

/// Default channel capacity; slower subscribers skip ahead past this.
pub const DEFAULT_CAPACITY: usize = 256;

/// A message posted to a support request
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub request_id: Uuid,
    pub message: MessageWithAuthor,
}

/// Broadcast hub for chat events
#[derive(Debug, Clone)]
pub struct ChatEvents {
    tx: broadcast::Sender<Arc<ChatEvent>>,
}

impl ChatEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event, returning how many subscribers were listening.
    pub fn publish(&self, event: ChatEvent) -> usize {
        // send() only fails when nobody is subscribed
        self.tx.send(Arc::new(event)).unwrap_or(0)
    }

    /// Stream of events for a single support request.
    ///
    /// The stream ends when the hub is dropped. Lagging subscribers lose the
    /// overflowed events and continue from the oldest retained one.
    pub fn subscribe(&self, request_id: Uuid) -> impl Stream<Item = Arc<ChatEvent>> + Send + 'static {
        let rx = self.tx.subscribe();
        stream::unfold(rx, move |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.request_id == request_id => return Some((event, rx)),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(%request_id, skipped, "chat subscriber lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
    }
}

impl Default for ChatEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures::StreamExt;

    fn event(request_id: Uuid, text: &str) -> ChatEvent {
        ChatEvent {
            request_id,
            message: MessageWithAuthor {
                id: Uuid::new_v4(),
                support_request_id: request_id,
                text: text.to_owned(),
                sent_at: Utc::now(),
                read_at: None,
                author_id: Uuid::new_v4(),
                author_name: "Guest".into(),
            },
        }
    }

    #[test]
    fn publish_without_subscribers() {
        let hub = ChatEvents::default();
        assert_eq!(hub.publish(event(Uuid::new_v4(), "lost")), 0);
    }

    #[tokio::test]
    async fn subscriber_sees_only_its_request() {
        let hub = ChatEvents::default();
        let watched = Uuid::new_v4();
        let mut stream = Box::pin(hub.subscribe(watched));

        hub.publish(event(Uuid::new_v4(), "other"));
        assert_eq!(hub.publish(event(watched, "mine")), 1);

        let received = stream.next().await.expect("event");
        assert_eq!(received.request_id, watched);
        assert_eq!(received.message.text, "mine");
    }

    #[tokio::test]
    async fn lagging_subscriber_keeps_going() {
        let hub = ChatEvents::new(2);
        let watched = Uuid::new_v4();
        let mut stream = Box::pin(hub.subscribe(watched));

        for i in 0..5 {
            hub.publish(event(watched, &format!("m{}", i)));
        }

        // Oldest events were dropped; the two newest remain
        assert_eq!(stream.next().await.unwrap().message.text, "m3");
        assert_eq!(stream.next().await.unwrap().message.text, "m4");
    }

    #[tokio::test]
    async fn stream_ends_when_hub_dropped() {
        let hub = ChatEvents::default();
        let mut stream = Box::pin(hub.subscribe(Uuid::new_v4()));
        drop(hub);
        assert!(stream.next().await.is_none());
    }
}
