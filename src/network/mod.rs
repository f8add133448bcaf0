//! Network Layer
//!
//! Wire codec for replicated events. Transport is up to the embedding
//! game; this layer only turns a frame's outgoing events into bytes and
//! validates what comes back before it reaches a world.

pub mod protocol;

pub use protocol::{
    CodecError, NetMessage, WireEvent, PROTOCOL_VERSION,
    decode_message, decode_json_message,
};
