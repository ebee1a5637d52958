//! WebSocket handler for engine connections
//!
//! Each accepted connection gets its own correlation triple (command bus,
//! dispatcher, startup sequence); connections share no state and are safe
//! to run concurrently.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};

use blockline_protocol::OutboundPacket;
use blockline_session::{
    CommandBus, Dispatcher, EngineEvent, EventBus, PendingCommands, StartupSequence,
};

use crate::settings::Settings;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(settings): State<Arc<Settings>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, settings))
}

/// Handle an individual engine connection
async fn handle_socket(socket: WebSocket, settings: Arc<Settings>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    tracing::info!("engine connected, starting session protocol");

    // One triple per connection
    let (tx, mut rx) = mpsc::channel::<OutboundPacket>(32);
    let pending = Arc::new(Mutex::new(PendingCommands::default()));
    let events = EventBus::new();
    subscribe_event_logger(&events).await;

    let bus = CommandBus::new(tx, Arc::clone(&pending));
    let dispatcher = Dispatcher::new(Arc::clone(&pending), events);

    // Writer task: serialize packets and push them onto the socket
    let log_full_wire = settings.log_full_wire;
    let send_task = tokio::spawn(async move {
        while let Some(packet) = rx.recv().await {
            let json = match serde_json::to_string(&packet) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("failed to serialize outbound packet: {e}");
                    continue;
                }
            };
            log_outbound(&packet, &json, log_full_wire);
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // The startup sequence runs in its own task so inbound dispatch below
    // can resolve its waiters while it is suspended.
    let sequence_task = tokio::spawn(run_startup(bus, Arc::clone(&settings)));

    // Reader loop: feed the dispatcher until the connection dies
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if log_full_wire {
                    tracing::debug!(frame = %text, "inbound frame");
                }
                dispatcher.handle_raw(&text).await;
            }
            Ok(Message::Close(_)) => {
                tracing::info!("engine closed the connection");
                break;
            }
            Ok(Message::Ping(_)) => {}
            Err(e) => {
                tracing::error!("websocket error: {e}");
                break;
            }
            _ => {}
        }
    }

    // Terminal sweep: no waiter may await forever
    let swept = pending.lock().await.reject_all();
    if swept > 0 {
        tracing::debug!(count = swept, "rejected pending commands on close");
    }

    // Dropping the writer makes any still-running sequence fail fast
    send_task.abort();
    let _ = sequence_task.await;

    tracing::info!("engine session terminated");
}

async fn run_startup(bus: CommandBus, settings: Arc<Settings>) {
    let mut sequence = StartupSequence::new(
        &settings.subscribe_event,
        settings.settle,
        settings.startup_commands.clone(),
    );
    match sequence.run(&bus).await {
        Ok(outcomes) => {
            tracing::info!(commands = outcomes.len(), "startup sequence finished");
        }
        Err(e) => tracing::error!("startup sequence failed: {e}"),
    }
}

/// Mirror every uncorrelated engine message into the log.
async fn subscribe_event_logger(events: &EventBus) {
    events
        .subscribe(|event| match event {
            EngineEvent::Error { status_message } => {
                tracing::warn!(%status_message, "engine error");
            }
            EngineEvent::Notification { purpose, body } => {
                tracing::info!(%purpose, %body, "engine event");
            }
        })
        .await;
}

fn log_outbound(packet: &OutboundPacket, json: &str, full: bool) {
    if full {
        tracing::debug!(frame = %json, "outbound frame");
    } else {
        tracing::debug!(
            purpose = %packet.purpose(),
            request_id = %packet.request_id(),
            "outbound packet"
        );
    }
}
