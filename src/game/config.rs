//! Simulation Configuration
//!
//! Runtime knobs for a simulation instance. Loaded from JSON (every field
//! optional) and overlaid by `SIM_*` environment variables.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Which side of the network this instance plays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    /// Single-player: authoritative, nothing leaves the process.
    #[default]
    Standalone,
    /// Authoritative host; broadcasts replicated events.
    Server,
    /// Replica; submits local fire and applies what the server sends.
    Client,
}

impl Authority {
    /// May this instance make non-deterministic decisions
    /// (collisions, sub-gun fire, proximity triggers)?
    #[inline]
    pub fn is_authoritative(self) -> bool {
        !matches!(self, Authority::Client)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standalone" => Some(Self::Standalone),
            "server" => Some(Self::Server),
            "client" => Some(Self::Client),
            _ => None,
        }
    }
}

/// Team rules in effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Players and good guys against bad guys.
    #[default]
    Coop,
    /// Everyone may hurt everyone.
    Deathmatch,
}

impl GameMode {
    /// Player-versus-player rules apply.
    #[inline]
    pub fn is_pvp(self) -> bool {
        matches!(self, GameMode::Deathmatch)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "coop" => Some(Self::Coop),
            "deathmatch" | "pvp" => Some(Self::Deathmatch),
            _ => None,
        }
    }
}

/// What the dispatcher does with events whose delay has not run out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayPolicy {
    /// Keep them, ahead of anything enqueued during this pass.
    #[default]
    Requeue,
    /// Drop them when the queue is cleared (legacy behaviour).
    DropStale,
}

impl DelayPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "requeue" => Some(Self::Requeue),
            "drop_stale" | "drop" => Some(Self::DropStale),
            _ => None,
        }
    }
}

/// Effect of an active per-target hit lock on a new bullet contact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitLockPolicy {
    /// Contact is reported as no hit at all: no damage, no sound.
    #[default]
    SuppressHit,
    /// Damage still applies; only the hit sound is muted.
    SoundOnly,
}

/// Configuration errors (asset and config loading).
///
/// Always fatal at load time. The simulation never starts with one pending.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("{source_name}: cannot read: {error}")]
    Io {
        /// File or asset name.
        source_name: String,
        /// Underlying error.
        #[source]
        error: std::io::Error,
    },

    /// JSON did not parse.
    #[error("{source_name}: malformed JSON: {error}")]
    Json {
        /// File or asset name.
        source_name: String,
        /// Underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// A gun names a bullet class that does not exist.
    #[error("{source_name}: gun '{gun}' references unknown bullet class '{bullet}'")]
    UnknownBulletClass {
        /// File or asset name.
        source_name: String,
        /// Gun doing the referencing.
        gun: String,
        /// Missing bullet class name.
        bullet: String,
    },

    /// A bullet class names a sub-gun that does not exist.
    #[error("{source_name}: bullet class '{bullet}' references unknown gun '{gun}'")]
    UnknownGun {
        /// File or asset name.
        source_name: String,
        /// Bullet class doing the referencing.
        bullet: String,
        /// Missing gun name.
        gun: String,
    },

    /// Two definitions share a name.
    #[error("{source_name}: duplicate {kind} name '{name}'")]
    DuplicateName {
        /// File or asset name.
        source_name: String,
        /// "bullet" or "gun".
        kind: &'static str,
        /// The repeated name.
        name: String,
    },

    /// A `[low, high]` pair with low > high.
    #[error("{source_name}: '{name}' has inverted {field} range [{low}, {high}]")]
    InvertedRange {
        /// File or asset name.
        source_name: String,
        /// Definition name.
        name: String,
        /// Field name.
        field: &'static str,
        /// Lower bound.
        low: i32,
        /// Upper bound.
        high: i32,
    },

    /// Tile map row contains an unknown character or rows differ in width.
    #[error("map row {row}: {reason}")]
    InvalidMap {
        /// Row index.
        row: usize,
        /// What is wrong.
        reason: String,
    },

    /// An environment variable holds an unusable value.
    #[error("environment variable {var}={value} is not valid")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Configuration for a simulation instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Network role.
    pub authority: Authority,
    /// Team rules.
    pub game_mode: GameMode,
    /// Co-op only: may players hurt their own team.
    pub friendly_fire: bool,
    /// Not-yet-due event handling.
    pub delay_policy: DelayPolicy,
    /// Hit lock semantics.
    pub hit_lock_policy: HitLockPolicy,
    /// Ticks a target stays locked after being hit.
    pub hit_lock_ticks: i32,
    /// Bullet pool slots allocated up front.
    pub initial_bullet_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            authority: Authority::Standalone,
            game_mode: GameMode::Coop,
            friendly_fire: false,
            delay_policy: DelayPolicy::Requeue,
            hit_lock_policy: HitLockPolicy::SuppressHit,
            hit_lock_ticks: 12,
            initial_bullet_capacity: 64,
        }
    }
}

impl SimConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str, source_name: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|error| ConfigError::Json {
            source_name: source_name.to_string(),
            error,
        })
    }

    /// Defaults overlaid by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|var| std::env::var(var).ok())
    }

    /// Overlay values from a variable lookup (`SIM_*` names).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn invalid(var: &'static str, value: String) -> ConfigError {
            ConfigError::InvalidEnv { var, value }
        }

        if let Some(v) = lookup("SIM_AUTHORITY") {
            self.authority = Authority::parse(&v).ok_or_else(|| invalid("SIM_AUTHORITY", v))?;
        }
        if let Some(v) = lookup("SIM_GAME_MODE") {
            self.game_mode = GameMode::parse(&v).ok_or_else(|| invalid("SIM_GAME_MODE", v))?;
        }
        if let Some(v) = lookup("SIM_FRIENDLY_FIRE") {
            self.friendly_fire = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid("SIM_FRIENDLY_FIRE", v)),
            };
        }
        if let Some(v) = lookup("SIM_DELAY_POLICY") {
            self.delay_policy =
                DelayPolicy::parse(&v).ok_or_else(|| invalid("SIM_DELAY_POLICY", v))?;
        }
        if let Some(v) = lookup("SIM_HIT_LOCK_TICKS") {
            self.hit_lock_ticks = match v.trim().parse::<i32>() {
                Ok(n) if n >= 0 => n,
                _ => return Err(invalid("SIM_HIT_LOCK_TICKS", v)),
            };
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.authority, Authority::Standalone);
        assert_eq!(config.delay_policy, DelayPolicy::Requeue);
        assert_eq!(config.hit_lock_policy, HitLockPolicy::SuppressHit);
        assert_eq!(config.hit_lock_ticks, 12);
    }

    #[test]
    fn test_partial_json() {
        let config = SimConfig::from_json_str(
            r#"{ "authority": "server", "delay_policy": "drop_stale" }"#,
            "test.json",
        ).unwrap();
        assert_eq!(config.authority, Authority::Server);
        assert_eq!(config.delay_policy, DelayPolicy::DropStale);
        assert_eq!(config.hit_lock_ticks, 12);
    }

    #[test]
    fn test_malformed_json_names_source() {
        let err = SimConfig::from_json_str("{ nope", "broken.json").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_env_overlay() {
        let config = SimConfig::default()
            .with_overrides(lookup_from(&[
                ("SIM_AUTHORITY", "Client"),
                ("SIM_GAME_MODE", "deathmatch"),
                ("SIM_FRIENDLY_FIRE", "on"),
                ("SIM_HIT_LOCK_TICKS", "0"),
            ]))
            .unwrap();
        assert_eq!(config.authority, Authority::Client);
        assert!(!config.authority.is_authoritative());
        assert!(config.game_mode.is_pvp());
        assert!(config.friendly_fire);
        assert_eq!(config.hit_lock_ticks, 0);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let err = SimConfig::default()
            .with_overrides(lookup_from(&[("SIM_HIT_LOCK_TICKS", "-3")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "SIM_HIT_LOCK_TICKS", .. }));

        let err = SimConfig::default()
            .with_overrides(lookup_from(&[("SIM_AUTHORITY", "overlord")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "SIM_AUTHORITY", .. }));
    }
}
