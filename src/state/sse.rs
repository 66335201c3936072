use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Broadcast hub fanning contest events out to every SSE subscriber.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_broadcast_events() {
        let hub = SseHub::new(4);
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        assert_eq!(hub.receiver_count(), 2);

        hub.broadcast(ServerEvent {
            event: Some("status-update".into()),
            data: "{}".into(),
        });

        assert_eq!(first.recv().await.unwrap().data, "{}");
        assert_eq!(
            second.recv().await.unwrap().event.as_deref(),
            Some("status-update")
        );
    }

    #[test]
    fn broadcast_without_subscribers_is_ignored() {
        let hub = SseHub::new(0);
        hub.broadcast(ServerEvent {
            event: None,
            data: "dropped".into(),
        });
        assert_eq!(hub.receiver_count(), 0);
    }
}
