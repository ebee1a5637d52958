//! Request/response correlation for engine commands.
//!
//! The [`CommandBus`] mints a fresh request id per outbound command, parks
//! a oneshot waiter in [`PendingCommands`], and hands the packet to the
//! writer task. The dispatcher resolves the waiter when the correlated
//! response arrives; closing the connection sweeps the table so no waiter
//! is left awaiting forever.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use uuid::Uuid;

use blockline_protocol::{CommandOutcome, OutboundPacket};

/// Command issue errors.
///
/// Logical command failure is not in this enum: a command the engine
/// executed but which failed in-game is a fulfilled [`CommandOutcome`]
/// with `success == false`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Connection terminated while the command was pending
    #[error("connection closed before a response arrived")]
    ConnectionClosed,
    /// Failed to hand the packet to the transport
    #[error("failed to send command: {0}")]
    SendFailed(String),
}

/// Pending command waiters keyed by request id.
///
/// Scoped to one connection. Resolution consumes the waiter's sender, so
/// each waiter completes at most once; the entry never outlives its
/// resolution.
#[derive(Default)]
pub struct PendingCommands {
    inner: HashMap<Uuid, oneshot::Sender<CommandOutcome>>,
}

impl PendingCommands {
    pub fn insert(&mut self, request_id: Uuid, tx: oneshot::Sender<CommandOutcome>) {
        self.inner.insert(request_id, tx);
    }

    pub fn contains(&self, request_id: &Uuid) -> bool {
        self.inner.contains_key(request_id)
    }

    /// Resolve and remove a pending command.
    ///
    /// Returns false if no waiter exists for this id - the response is
    /// stale, duplicated, or was never issued by this side. That is an
    /// unmatched correlation, not an error.
    pub fn resolve(&mut self, request_id: &Uuid, outcome: CommandOutcome) -> bool {
        if let Some(tx) = self.inner.remove(request_id) {
            let _ = tx.send(outcome);
            true
        } else {
            tracing::debug!(%request_id, "response for unknown request id, dropping");
            false
        }
    }

    pub fn remove(&mut self, request_id: &Uuid) -> bool {
        self.inner.remove(request_id).is_some()
    }

    /// Terminal sweep: reject every pending command by dropping its sender,
    /// so each waiter observes [`CommandError::ConnectionClosed`].
    ///
    /// Returns the number of commands swept; the table is empty afterward.
    pub fn reject_all(&mut self) -> usize {
        let count = self.inner.len();
        self.inner.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Command bus for one engine connection.
///
/// Clonable; all clones share the same pending table and writer channel.
#[derive(Clone)]
pub struct CommandBus {
    tx: mpsc::Sender<OutboundPacket>,
    pending: Arc<Mutex<PendingCommands>>,
}

impl CommandBus {
    /// Create a bus over the writer channel.
    ///
    /// The pending table is shared with the dispatcher for response
    /// correlation.
    pub fn new(tx: mpsc::Sender<OutboundPacket>, pending: Arc<Mutex<PendingCommands>>) -> Self {
        Self { tx, pending }
    }

    /// Issue a slash command and await the correlated response.
    ///
    /// The waiter is registered before the packet is handed to the
    /// transport; a send failure removes it again, so a failed issue
    /// leaves no entry behind and aborts synchronously.
    pub async fn command(
        &self,
        command_line: impl Into<String>,
    ) -> Result<CommandOutcome, CommandError> {
        let (request_id, response_rx) = self.register().await;
        let packet = OutboundPacket::command(request_id, command_line.into());

        if let Err(e) = self.tx.send(packet).await {
            self.pending.lock().await.remove(&request_id);
            return Err(CommandError::SendFailed(e.to_string()));
        }

        response_rx.await.map_err(|_| CommandError::ConnectionClosed)
    }

    /// Transmit an event subscription.
    ///
    /// Fire-and-forget: the engine does not guarantee a response to
    /// subscriptions, so nothing is parked in the pending table.
    pub async fn subscribe(&self, event_name: impl Into<String>) -> Result<(), CommandError> {
        let packet = OutboundPacket::subscribe(Uuid::new_v4(), event_name.into());
        self.tx
            .send(packet)
            .await
            .map_err(|e| CommandError::SendFailed(e.to_string()))
    }

    /// Mint an unused request id and park a fresh waiter under it.
    async fn register(&self) -> (Uuid, oneshot::Receiver<CommandOutcome>) {
        let (response_tx, response_rx) = oneshot::channel();
        let mut pending = self.pending.lock().await;

        // v4 collisions are vanishingly unlikely; re-mint while one is live
        let mut request_id = Uuid::new_v4();
        while pending.contains(&request_id) {
            request_id = Uuid::new_v4();
        }

        pending.insert(request_id, response_tx);
        (request_id, response_rx)
    }

    /// Shared pending table (for the dispatcher and the terminal sweep).
    pub fn pending(&self) -> Arc<Mutex<PendingCommands>> {
        Arc::clone(&self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(status_code: i32, marker: &str) -> CommandOutcome {
        CommandOutcome {
            success: status_code == 0,
            status_code,
            status_message: None,
            body: json!({ "marker": marker }),
        }
    }

    fn bus_with_channel(capacity: usize) -> (CommandBus, mpsc::Receiver<OutboundPacket>) {
        let (tx, rx) = mpsc::channel(capacity);
        let bus = CommandBus::new(tx, Arc::new(Mutex::new(PendingCommands::default())));
        (bus, rx)
    }

    #[tokio::test]
    async fn resolves_out_of_order_responses_to_the_right_waiters() {
        let (bus, mut rx) = bus_with_channel(8);
        let pending = bus.pending();

        let bus_a = bus.clone();
        let first = tokio::spawn(async move { bus_a.command("say first").await });
        let packet_a = rx.recv().await.unwrap();

        let bus_b = bus.clone();
        let second = tokio::spawn(async move { bus_b.command("say second").await });
        let packet_b = rx.recv().await.unwrap();

        // Resolve in reverse arrival order
        assert!(pending
            .lock()
            .await
            .resolve(&packet_b.request_id(), outcome(0, "second")));
        assert!(pending
            .lock()
            .await
            .resolve(&packet_a.request_id(), outcome(0, "first")));

        assert_eq!(first.await.unwrap().unwrap().body["marker"], "first");
        assert_eq!(second.await.unwrap().unwrap().body["marker"], "second");
        assert!(pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unmatched_response_is_a_no_op() {
        let pending = Arc::new(Mutex::new(PendingCommands::default()));
        let resolved = pending
            .lock()
            .await
            .resolve(&Uuid::new_v4(), outcome(0, "stale"));
        assert!(!resolved);
    }

    #[tokio::test]
    async fn each_waiter_resolves_at_most_once() {
        let (bus, mut rx) = bus_with_channel(8);
        let pending = bus.pending();

        let task = tokio::spawn(async move { bus.command("say once").await });
        let packet = rx.recv().await.unwrap();
        let request_id = packet.request_id();

        assert!(pending.lock().await.resolve(&request_id, outcome(0, "a")));
        // The entry is gone; a duplicate response does not match
        assert!(!pending.lock().await.resolve(&request_id, outcome(0, "b")));

        assert_eq!(task.await.unwrap().unwrap().body["marker"], "a");
    }

    #[tokio::test]
    async fn close_rejects_all_pending_waiters() {
        let (bus, mut rx) = bus_with_channel(8);
        let pending = bus.pending();

        let bus_a = bus.clone();
        let first = tokio::spawn(async move { bus_a.command("say one").await });
        rx.recv().await.unwrap();
        let bus_b = bus.clone();
        let second = tokio::spawn(async move { bus_b.command("say two").await });
        rx.recv().await.unwrap();

        let swept = pending.lock().await.reject_all();
        assert_eq!(swept, 2);
        assert!(pending.lock().await.is_empty());

        assert_eq!(first.await.unwrap(), Err(CommandError::ConnectionClosed));
        assert_eq!(second.await.unwrap(), Err(CommandError::ConnectionClosed));
    }

    #[tokio::test]
    async fn send_failure_aborts_and_leaves_no_entry() {
        let (tx, rx) = mpsc::channel(1);
        let bus = CommandBus::new(tx, Arc::new(Mutex::new(PendingCommands::default())));
        drop(rx);

        let result = bus.command("say into the void").await;
        assert!(matches!(result, Err(CommandError::SendFailed(_))));
        assert!(bus.pending().lock().await.is_empty());

        let result = bus.subscribe("PlayerMessage").await;
        assert!(matches!(result, Err(CommandError::SendFailed(_))));
    }

    #[tokio::test]
    async fn subscribe_does_not_register_a_waiter() {
        let (bus, mut rx) = bus_with_channel(8);

        bus.subscribe("PlayerMessage").await.unwrap();
        let packet = rx.recv().await.unwrap();
        assert!(matches!(packet, OutboundPacket::Subscribe(_)));
        assert!(bus.pending().lock().await.is_empty());
    }
}
