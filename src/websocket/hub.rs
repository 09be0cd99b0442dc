//! Broadcast Hub
//!
//! Registry of dashboard subscribers plus the event history replayed to
//! late joiners. One lock covers both, so an attach sees either all of a
//! publish or none of it.
//!
//! Each subscriber is a bounded channel drained by its own websocket
//! task; the hub never waits on the network.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::history::HistoryBuffer;
use crate::monitor::MonitorEvent;

/// Unique identifier for a dashboard subscriber
pub type SubscriberId = String;

/// Serialized event as sent on the wire
pub type EventText = Arc<str>;

/// Configuration for the broadcast hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Number of events kept for replay
    pub history_capacity: usize,
    /// Live events a subscriber may lag behind before it is dropped
    pub subscriber_queue: usize,
    /// Maximum number of concurrent subscribers
    pub max_subscribers: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            history_capacity: 5000,
            subscriber_queue: 1024,
            max_subscribers: 256,
        }
    }
}

/// A registered subscriber's receiving end
pub struct Subscription {
    pub id: SubscriberId,
    /// History replay followed by live events. Closed when the hub drops
    /// the subscriber.
    pub receiver: mpsc::Receiver<EventText>,
    /// Number of history entries queued ahead of live traffic
    pub replayed: usize,
}

struct HubInner {
    history: HistoryBuffer<EventText>,
    subscribers: HashMap<SubscriberId, mpsc::Sender<EventText>>,
}

/// Fans published events out to every subscriber
pub struct BroadcastHub {
    inner: Mutex<HubInner>,
    config: HubConfig,
}

impl BroadcastHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            inner: Mutex::new(HubInner {
                history: HistoryBuffer::new(config.history_capacity),
                subscribers: HashMap::new(),
            }),
            config,
        }
    }

    /// Record an event in history and deliver it to every subscriber.
    ///
    /// Subscribers whose queue is full or closed are dropped. Returns the
    /// number of subscribers that accepted the event.
    pub async fn publish(&self, message: impl Into<EventText>) -> usize {
        let message = message.into();
        let mut inner = self.inner.lock().await;
        inner.history.push(Arc::clone(&message));

        inner.subscribers.retain(|id, sender| {
            match sender.try_send(Arc::clone(&message)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(subscriber_id = %id, "Subscriber lagging, dropping");
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(subscriber_id = %id, "Subscriber gone, dropping");
                    false
                }
            }
        });

        let delivered = inner.subscribers.len();
        if delivered > 0 {
            tracing::trace!(subscribers = delivered, "Broadcast event");
        }
        delivered
    }

    /// Serialize and publish a monitor event.
    pub async fn publish_event(&self, event: &MonitorEvent) -> usize {
        match event.to_json() {
            Ok(text) => self.publish(text).await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize event");
                0
            }
        }
    }

    /// Register a subscriber, queueing the current history for it first.
    pub async fn attach(&self) -> Result<Subscription, HubError> {
        let mut inner = self.inner.lock().await;
        if inner.subscribers.len() >= self.config.max_subscribers {
            return Err(HubError::TooManySubscribers(self.config.max_subscribers));
        }

        let capacity = (self.config.history_capacity + self.config.subscriber_queue).max(1);
        let (sender, receiver) = mpsc::channel(capacity);

        // Capacity covers a full history, so replay can't fail.
        let mut replayed = 0;
        for message in inner.history.iter() {
            if sender.try_send(Arc::clone(message)).is_ok() {
                replayed += 1;
            }
        }

        let id = Uuid::new_v4().to_string();
        inner.subscribers.insert(id.clone(), sender);

        tracing::info!(subscriber_id = %id, replayed, "Dashboard subscribed");
        Ok(Subscription {
            id,
            receiver,
            replayed,
        })
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub async fn detach(&self, id: &str) -> bool {
        let removed = self.inner.lock().await.subscribers.remove(id).is_some();
        if removed {
            tracing::info!(subscriber_id = %id, "Dashboard unsubscribed");
        }
        removed
    }

    /// Get the current subscriber count
    pub async fn subscriber_count(&self) -> usize {
        self.inner.lock().await.subscribers.len()
    }

    /// Snapshot of the history in arrival order
    pub async fn history(&self) -> Vec<EventText> {
        self.inner.lock().await.history.get_all()
    }

    pub async fn history_len(&self) -> usize {
        self.inner.lock().await.history.len()
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }
}

/// Errors that can occur in the broadcast hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many subscribers (limit: {0})")]
    TooManySubscribers(usize),
}
