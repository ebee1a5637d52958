//! Event side channel for uncorrelated engine messages.
//!
//! Push-based: subscribers register callbacks that are invoked for every
//! uncorrelated message the dispatcher routes here. No reply is ever
//! expected on this path.

use std::sync::Arc;

use tokio::sync::Mutex;

use blockline_protocol::MessagePurpose;

/// Uncorrelated message surfaced by the dispatcher.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Engine-level failure not tied to a specific command
    Error { status_message: String },
    /// Subscribed event notification or unrecognized purpose
    Notification {
        purpose: MessagePurpose,
        body: serde_json::Value,
    },
}

/// Subscriber bus for engine events.
///
/// The bus holds strong references to subscribers; they persist until the
/// bus is dropped with the rest of the connection triple.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Box<dyn FnMut(EngineEvent) + Send + 'static>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all events.
    pub async fn subscribe(&self, callback: impl FnMut(EngineEvent) + Send + 'static) {
        self.subscribers.lock().await.push(Box::new(callback));
    }

    /// Dispatch an event to every subscriber, each receiving a clone.
    pub async fn dispatch(&self, event: EngineEvent) {
        let mut subscribers = self.subscribers.lock().await;
        for subscriber in subscribers.iter_mut() {
            subscriber(event.clone());
        }
    }
}
