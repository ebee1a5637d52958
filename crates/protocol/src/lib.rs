//! Blockline Protocol - wire types for the game-engine WebSocket protocol
//!
//! This crate contains the JSON documents exchanged with the game engine
//! over its `/connect` WebSocket protocol:
//! - Outbound packets (command requests, event subscriptions)
//! - Inbound message classification (responses, errors, events)
//! - The command outcome delivered to correlation waiters
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, uuid, and thiserror
//! 2. **No business logic** - Pure data types, serialization, and classification
//! 3. **Wire-dictated names** - Field names are the engine's, serialized camelCase

pub mod messages;
pub mod outcome;

pub use messages::{
    classify, CommandRequest, CommandRequestBody, CommandResponse, InboundMessage, MessagePurpose,
    OutboundPacket, PacketHeader, ParseError, SubscribeBody, SubscribeRequest, PROTOCOL_VERSION,
};
pub use outcome::CommandOutcome;
