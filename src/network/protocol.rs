//! Protocol Messages
//!
//! Wire format for replicated game events. One [`NetMessage`] carries the
//! events a peer produced during one tick. Binary (bincode) is the
//! production format; JSON is kept for debugging and logs.
//!
//! Nothing received is trusted: [`decode_message`] checks the version,
//! that every tag matches its payload, that no presentation-only event
//! crossed the wire and that every class or gun id exists in the local
//! registry before the events reach a world queue.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::warn;

use crate::game::bullet_class::ClassRegistry;
use crate::game::events::{EventTag, GameEvent, GameEventKind};
use crate::game::thing::ThingKind;

/// Wire format version. Bumped on any payload layout change.
pub const PROTOCOL_VERSION: u16 = 1;

// =============================================================================
// ERRORS
// =============================================================================

/// Why a received message was rejected.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Peer speaks another protocol version.
    #[error("protocol version {found}, expected {expected}")]
    Version {
        /// Ours
        expected: u16,
        /// Theirs
        found: u16,
    },

    /// Tag byte names no event type.
    #[error("event {index}: unknown tag {tag}")]
    UnknownTag {
        /// Position in the message
        index: usize,
        /// Raw tag
        tag: u8,
    },

    /// Tag byte and payload variant disagree.
    #[error("event {index}: tag {tag:?} carries a {payload:?} payload")]
    TagMismatch {
        /// Position in the message
        index: usize,
        /// Declared tag
        tag: EventTag,
        /// Actual payload type
        payload: EventTag,
    },

    /// A presentation event was sent over the network.
    #[error("event {index}: {tag:?} is local only")]
    LocalOnly {
        /// Position in the message
        index: usize,
        /// Tag
        tag: EventTag,
    },

    /// Negative delay.
    #[error("event {index}: negative delay {delay}")]
    InvalidDelay {
        /// Position in the message
        index: usize,
        /// Value received
        delay: i32,
    },

    /// Bullet class id outside the registry.
    #[error("event {index}: unknown bullet class {class}")]
    UnknownBulletClass {
        /// Position in the message
        index: usize,
        /// Raw id
        class: u16,
    },

    /// Gun id outside the registry.
    #[error("event {index}: unknown gun {gun}")]
    UnknownGun {
        /// Position in the message
        index: usize,
        /// Raw id
        gun: u16,
    },

    /// Damage aimed at a bullet.
    #[error("event {index}: bullets cannot take damage")]
    BulletDamageTarget {
        /// Position in the message
        index: usize,
    },

    /// Binary decode failed.
    #[error("binary decode: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON decode failed.
    #[error("json decode: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// MESSAGES
// =============================================================================

/// One event on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEvent {
    /// [`EventTag`] as a byte
    pub tag: u8,
    /// Remaining delay
    pub delay: i32,
    /// Payload
    pub payload: GameEventKind,
}

impl WireEvent {
    /// Wrap a queued event.
    pub fn from_event(event: &GameEvent) -> Self {
        Self {
            tag: event.tag() as u8,
            delay: event.delay,
            payload: event.kind,
        }
    }
}

/// Events from one peer for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetMessage {
    /// Protocol version
    pub version: u16,
    /// Sender's tick when the events were applied
    pub tick: u32,
    /// Events in apply order
    pub events: Vec<WireEvent>,
}

impl NetMessage {
    /// Build from a frame's outgoing events. Local-only events are dropped.
    pub fn from_events(tick: u32, events: &[GameEvent]) -> Self {
        let events = events
            .iter()
            .filter(|e| {
                let local = e.routing().local_only;
                if local {
                    warn!(tag = ?e.tag(), "local-only event not sent");
                }
                !local
            })
            .map(WireEvent::from_event)
            .collect();
        Self { version: PROTOCOL_VERSION, tick, events }
    }

    /// Events ready for [`SimulationWorld::receive_remote`].
    ///
    /// Call [`NetMessage::validate`] first; [`decode_message`] does both.
    ///
    /// [`SimulationWorld::receive_remote`]: crate::game::state::SimulationWorld::receive_remote
    pub fn into_events(self) -> Vec<GameEvent> {
        self.events
            .into_iter()
            .map(|e| GameEvent::from_remote(e.payload, e.delay))
            .collect()
    }

    /// Check every event against the protocol and the local registry.
    pub fn validate(&self, registry: &ClassRegistry) -> Result<(), CodecError> {
        if self.version != PROTOCOL_VERSION {
            return Err(CodecError::Version { expected: PROTOCOL_VERSION, found: self.version });
        }
        for (index, event) in self.events.iter().enumerate() {
            validate_event(index, event, registry)?;
        }
        Ok(())
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

fn validate_event(index: usize, event: &WireEvent, registry: &ClassRegistry) -> Result<(), CodecError> {
    let tag = EventTag::from_u8(event.tag).ok_or(CodecError::UnknownTag { index, tag: event.tag })?;
    let payload = event.payload.tag();
    if tag != payload {
        return Err(CodecError::TagMismatch { index, tag, payload });
    }
    if tag.routing().local_only {
        return Err(CodecError::LocalOnly { index, tag });
    }
    if event.delay < 0 {
        return Err(CodecError::InvalidDelay { index, delay: event.delay });
    }

    match event.payload {
        GameEventKind::GunFire(p) if !registry.has_gun(p.gun) => {
            Err(CodecError::UnknownGun { index, gun: p.gun.0 })
        }
        GameEventKind::AddBullet(p) if !registry.has_bullet(p.class) => {
            Err(CodecError::UnknownBulletClass { index, class: p.class.0 })
        }
        GameEventKind::ThingDamage(p) if p.target.kind == ThingKind::Bullet => {
            Err(CodecError::BulletDamageTarget { index })
        }
        _ => Ok(()),
    }
}

/// Decode and validate a binary message.
pub fn decode_message(bytes: &[u8], registry: &ClassRegistry) -> Result<NetMessage, CodecError> {
    let message = NetMessage::from_bytes(bytes)?;
    message.validate(registry)?;
    Ok(message)
}

/// Decode and validate a JSON message.
pub fn decode_json_message(s: &str, registry: &ClassRegistry) -> Result<NetMessage, CodecError> {
    let message = NetMessage::from_json(s)?;
    message.validate(registry)?;
    Ok(message)
}
