//! Blockline Session - per-connection correlation engine
//!
//! One instance of each of these types serves exactly one engine
//! connection; triples for different connections share no state.
//!
//! - [`CommandBus`] / [`PendingCommands`] - mint request ids, park waiters,
//!   resolve them when the correlated response arrives
//! - [`Dispatcher`] - classify the raw inbound stream and route it
//! - [`EventBus`] - side channel for uncorrelated engine messages
//! - [`StartupSequence`] - the ordered subscribe-then-commands protocol

pub mod correlator;
pub mod dispatcher;
pub mod event_bus;
pub mod sequencer;

pub use correlator::{CommandBus, CommandError, PendingCommands};
pub use dispatcher::Dispatcher;
pub use event_bus::{EngineEvent, EventBus};
pub use sequencer::{SequenceState, StartupSequence};
