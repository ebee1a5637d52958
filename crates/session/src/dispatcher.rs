//! Inbound message classification and routing.
//!
//! Exactly one dispatcher consumes a connection's raw inbound stream.
//! Correlated responses resolve their pending waiter; `error` and event
//! purposes go to the event bus; malformed documents are logged and
//! dropped without touching the pending table.

use std::sync::Arc;

use tokio::sync::Mutex;

use blockline_protocol::{classify, CommandOutcome, InboundMessage};

use crate::correlator::PendingCommands;
use crate::event_bus::{EngineEvent, EventBus};

pub struct Dispatcher {
    pending: Arc<Mutex<PendingCommands>>,
    events: EventBus,
}

impl Dispatcher {
    pub fn new(pending: Arc<Mutex<PendingCommands>>, events: EventBus) -> Self {
        Self { pending, events }
    }

    /// Classify and route one inbound text frame.
    ///
    /// Never fails: the two non-fatal cases (malformed document, unmatched
    /// response) are logged and dropped, everything else is delivered.
    pub async fn handle_raw(&self, text: &str) {
        let message = match classify(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("dropping inbound frame: {e}");
                return;
            }
        };

        match message {
            InboundMessage::EngineError { status_message } => {
                tracing::warn!(%status_message, "engine reported an error");
                self.events
                    .dispatch(EngineEvent::Error { status_message })
                    .await;
            }
            InboundMessage::CommandResponse(response) => {
                let Some(request_id) = response.request_id else {
                    tracing::debug!("command response without request id, dropping");
                    return;
                };
                if response.status_code != 0 {
                    tracing::warn!(
                        %request_id,
                        status_code = response.status_code,
                        status_message = response.status_message.as_deref().unwrap_or(""),
                        "command executed but failed logically"
                    );
                }
                self.pending
                    .lock()
                    .await
                    .resolve(&request_id, CommandOutcome::from(response));
            }
            InboundMessage::Event { purpose, body } => {
                self.events
                    .dispatch(EngineEvent::Notification { purpose, body })
                    .await;
            }
        }
    }
}
