//! In-process event bus fanning store changes out to live subscriptions.
//!
//! Each subscriber gets its own bounded mpsc queue. Publishing never blocks
//! on a subscriber: a full queue is skipped, which is safe because every
//! delivery downstream is a full-set re-query — any event still sitting in
//! the full queue re-syncs that subscriber after the write. A subscriber
//! that dropped its receiver is pruned on the next publish.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::constants::EVENT_BUS_BUFFER_SIZE;
use crate::models::RequestStatus;

/// A store change relevant to the live read views. Every variant carries the
/// participant pair so watchers can filter without re-reading the store.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    RequestCreated {
        student_id: String,
        mentor_id: String,
    },
    RequestResolved {
        student_id: String,
        mentor_id: String,
        status: RequestStatus,
    },
    ConnectionCreated {
        student_id: String,
        mentor_id: String,
    },
}

#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<StoreEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a receiver on which events will be delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<StoreEvent> {
        let size = buffer_size.unwrap_or(EVENT_BUS_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all live subscribers. A slow or closed subscriber
    /// never blocks or fails the publish; its queue already holds events
    /// that will trigger a re-query once it catches up.
    pub async fn publish(&self, event: StoreEvent) {
        let senders = {
            let mut subs = self.subscribers.lock().await;
            subs.retain(|s| !s.is_closed());
            subs.clone()
        };
        for sender in senders {
            match sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!("event-bus subscriber queue full, skipping delivery");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
    }

    #[cfg(test)]
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bus = EventBus::new();

        let mut rx1 = bus.subscribe(Some(5)).await;
        let mut rx2 = bus.subscribe(Some(5)).await;

        bus.publish(StoreEvent::RequestCreated {
            student_id: "s1".to_string(),
            mentor_id: "m1".to_string(),
        })
        .await;

        for rx in [&mut rx1, &mut rx2] {
            let event = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("delivery should be prompt")
                .expect("subscriber should get the event");
            match event {
                StoreEvent::RequestCreated { mentor_id, .. } => assert_eq!(mentor_id, "m1"),
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn full_subscriber_queue_does_not_block_publish() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(1)).await;

        timeout(Duration::from_secs(1), async {
            for _ in 0..10 {
                bus.publish(StoreEvent::RequestCreated {
                    student_id: "s1".to_string(),
                    mentor_id: "m1".to_string(),
                })
                .await;
            }
        })
        .await
        .expect("publish must not block on a full subscriber queue");

        // The queued event is still there for the subscriber to drain
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let bus = EventBus::new();

        let rx1 = bus.subscribe(Some(5)).await;
        let _rx2 = bus.subscribe(Some(5)).await;
        assert_eq!(bus.subscriber_count().await, 2);

        drop(rx1);
        bus.publish(StoreEvent::ConnectionCreated {
            student_id: "s1".to_string(),
            mentor_id: "m1".to_string(),
        })
        .await;

        assert_eq!(bus.subscriber_count().await, 1);
    }
}
