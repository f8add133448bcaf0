//! Bullet and Gun Class Definitions
//!
//! Immutable templates loaded once at startup. Loading is two-phase:
//! raw JSON definitions are parsed first, then every name reference
//! (gun → bullet, bullet → sub-guns) is resolved into a typed id. After
//! that the simulation never looks anything up by name.
//!
//! Speeds, gravity and friction are in full units per tick, ranges and
//! delays in ticks, sizes in pixels (half extents).

use std::collections::BTreeMap;
use std::path::Path;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::fixed::{Full, pixels_to_full};
use crate::core::vec2::FullVec2;
use crate::game::config::ConfigError;

/// Bundled class definitions.
pub const BUILTIN_CLASSES: &str = include_str!("../../data/combat_classes.json");

// =============================================================================
// IDS
// =============================================================================

/// Index of a resolved bullet class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BulletClassId(pub u16);

/// Index of a resolved gun class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GunId(pub u16);

/// Special damage carried by a bullet, matched against target immunities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SpecialDamage {
    /// Plain damage
    #[default]
    None = 0,
    /// Fire
    Flame = 1,
    /// Poison
    Poison = 2,
    /// Petrification
    Petrify = 3,
    /// Confusion
    Confuse = 4,
}

// =============================================================================
// RESOLVED CLASSES
// =============================================================================

/// Grenade-style vertical motion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Falling {
    /// dz lost per tick
    pub gravity: Full,
    /// Height at spawn
    pub start_z: Full,
    /// Vertical velocity at spawn
    pub start_dz: Full,
    /// Bounce off the floor (halve and invert dz) instead of stopping
    pub bounces: bool,
    /// Die on first landing
    pub destroy_on_drop: bool,
    /// Fired once on first landing
    pub drop_guns: Vec<GunId>,
}

/// Immutable bullet template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulletClass {
    /// Unique name
    pub name: String,
    /// Speed range, inclusive
    pub speed: (Full, Full),
    /// Range in ticks, inclusive
    pub range: (i32, i32),
    /// Damage per hit
    pub power: i32,
    /// Knockback multiplier
    pub mass: i32,
    /// Half extents of the footprint
    pub half_size: FullVec2,
    /// Ticks spent motionless after spawn
    pub delay: i32,
    /// Per-axis velocity loss per tick
    pub friction: Full,
    /// Special damage tag
    pub special: SpecialDamage,
    /// Ignore self-hit and team rules
    pub hurt_always: bool,
    /// Stop on objects and actors (false: pass through them)
    pub hits_objects: bool,
    /// Reflect off walls instead of dying
    pub wall_bounces: bool,
    /// Random velocity jitter each tick
    pub erratic: bool,
    /// Steering weight; 0 disables seeking
    pub seek_factor: i32,
    /// Spark particle when range runs out
    pub out_of_range_spark: bool,
    /// Vertical motion, if any
    pub falling: Option<Falling>,
    /// Fired where the bullet dies on a hit
    pub hit_guns: Vec<GunId>,
    /// Fired where the bullet runs out of range
    pub out_of_range_guns: Vec<GunId>,
    /// Fired when a character comes near
    pub proximity_guns: Vec<GunId>,
}

/// Immutable gun template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GunClass {
    /// Unique name
    pub name: String,
    /// Bullet fired
    pub bullet: BulletClassId,
    /// Bullets per shot
    pub count: i32,
    /// Degrees between adjacent bullets of one shot
    pub spread_width: i32,
    /// Degrees added to the aim direction
    pub angle_offset: i32,
    /// Height the bullets leave the muzzle at (added to the class start height)
    pub muzzle_z: Full,
}

// =============================================================================
// RAW DEFINITIONS (phase one)
// =============================================================================

fn default_one() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_size() -> [i32; 2] {
    [1, 1]
}

#[derive(Debug, Deserialize)]
struct RawAssets {
    #[serde(default)]
    bullets: Vec<RawBullet>,
    #[serde(default)]
    guns: Vec<RawGun>,
}

#[derive(Debug, Deserialize)]
struct RawFalling {
    gravity: Full,
    #[serde(default)]
    start_z: Full,
    #[serde(default)]
    start_dz: Full,
    #[serde(default)]
    bounces: bool,
    #[serde(default)]
    destroy_on_drop: bool,
    #[serde(default)]
    drop_guns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawBullet {
    name: String,
    speed: [Full; 2],
    range: [i32; 2],
    #[serde(default)]
    power: i32,
    #[serde(default = "default_one")]
    mass: i32,
    #[serde(default = "default_size")]
    size: [i32; 2],
    #[serde(default)]
    delay: i32,
    #[serde(default)]
    friction: Full,
    #[serde(default)]
    special: SpecialDamage,
    #[serde(default)]
    hurt_always: bool,
    #[serde(default = "default_true")]
    hits_objects: bool,
    #[serde(default)]
    wall_bounces: bool,
    #[serde(default)]
    erratic: bool,
    #[serde(default)]
    seek_factor: i32,
    #[serde(default)]
    out_of_range_spark: bool,
    #[serde(default)]
    falling: Option<RawFalling>,
    #[serde(default)]
    hit_guns: Vec<String>,
    #[serde(default)]
    out_of_range_guns: Vec<String>,
    #[serde(default)]
    proximity_guns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawGun {
    name: String,
    bullet: String,
    #[serde(default = "default_one")]
    count: i32,
    #[serde(default)]
    spread_width: i32,
    #[serde(default)]
    angle_offset: i32,
    #[serde(default)]
    muzzle_z: Full,
}

// =============================================================================
// REGISTRY
// =============================================================================

/// All bullet and gun classes, resolved.
#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    bullets: Vec<BulletClass>,
    guns: Vec<GunClass>,
    bullet_names: BTreeMap<String, BulletClassId>,
    gun_names: BTreeMap<String, GunId>,
}

impl ClassRegistry {
    /// The bundled `data/combat_classes.json`.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_CLASSES, "combat_classes.json")
    }

    /// Load from a JSON file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
            source_name: source_name.clone(),
            error,
        })?;
        Self::from_json_str(&json, &source_name)
    }

    /// Parse and resolve definitions. `source_name` labels every error.
    pub fn from_json_str(json: &str, source_name: &str) -> Result<Self, ConfigError> {
        let raw: RawAssets = serde_json::from_str(json).map_err(|error| ConfigError::Json {
            source_name: source_name.to_string(),
            error,
        })?;

        let src = || source_name.to_string();

        // Phase one: assign ids.
        let mut bullet_names = BTreeMap::new();
        for (i, b) in raw.bullets.iter().enumerate() {
            if bullet_names.insert(b.name.clone(), BulletClassId(i as u16)).is_some() {
                return Err(ConfigError::DuplicateName { source_name: src(), kind: "bullet", name: b.name.clone() });
            }
        }
        let mut gun_names = BTreeMap::new();
        for (i, g) in raw.guns.iter().enumerate() {
            if gun_names.insert(g.name.clone(), GunId(i as u16)).is_some() {
                return Err(ConfigError::DuplicateName { source_name: src(), kind: "gun", name: g.name.clone() });
            }
        }

        // Phase two: resolve references.
        let resolve_guns = |owner: &str, names: &[String]| -> Result<Vec<GunId>, ConfigError> {
            names
                .iter()
                .map(|n| {
                    gun_names.get(n).copied().ok_or_else(|| ConfigError::UnknownGun {
                        source_name: src(),
                        bullet: owner.to_string(),
                        gun: n.clone(),
                    })
                })
                .collect()
        };

        let mut bullets = Vec::with_capacity(raw.bullets.len());
        for b in &raw.bullets {
            check_range(source_name, &b.name, "speed", b.speed)?;
            check_range(source_name, &b.name, "range", b.range)?;

            let falling = match &b.falling {
                Some(f) => Some(Falling {
                    gravity: f.gravity,
                    start_z: f.start_z,
                    start_dz: f.start_dz,
                    bounces: f.bounces,
                    destroy_on_drop: f.destroy_on_drop,
                    drop_guns: resolve_guns(&b.name, &f.drop_guns)?,
                }),
                None => None,
            };

            bullets.push(BulletClass {
                name: b.name.clone(),
                speed: (b.speed[0], b.speed[1]),
                range: (b.range[0], b.range[1]),
                power: b.power,
                mass: b.mass,
                half_size: FullVec2::new(pixels_to_full(b.size[0]), pixels_to_full(b.size[1])),
                delay: b.delay,
                friction: b.friction,
                special: b.special,
                hurt_always: b.hurt_always,
                hits_objects: b.hits_objects,
                wall_bounces: b.wall_bounces,
                erratic: b.erratic,
                seek_factor: b.seek_factor,
                out_of_range_spark: b.out_of_range_spark,
                falling,
                hit_guns: resolve_guns(&b.name, &b.hit_guns)?,
                out_of_range_guns: resolve_guns(&b.name, &b.out_of_range_guns)?,
                proximity_guns: resolve_guns(&b.name, &b.proximity_guns)?,
            });
        }

        let mut guns = Vec::with_capacity(raw.guns.len());
        for g in &raw.guns {
            let bullet = bullet_names.get(&g.bullet).copied().ok_or_else(|| {
                ConfigError::UnknownBulletClass {
                    source_name: src(),
                    gun: g.name.clone(),
                    bullet: g.bullet.clone(),
                }
            })?;
            guns.push(GunClass {
                name: g.name.clone(),
                bullet,
                count: g.count.max(1),
                spread_width: g.spread_width,
                angle_offset: g.angle_offset,
                muzzle_z: g.muzzle_z,
            });
        }

        debug!(source = source_name, bullets = bullets.len(), guns = guns.len(), "loaded combat classes");

        Ok(Self { bullets, guns, bullet_names, gun_names })
    }

    /// Look up a bullet class. Ids come from this registry, so a bad one is a bug.
    #[inline]
    pub fn bullet(&self, id: BulletClassId) -> &BulletClass {
        &self.bullets[id.0 as usize]
    }

    /// Look up a gun class.
    #[inline]
    pub fn gun(&self, id: GunId) -> &GunClass {
        &self.guns[id.0 as usize]
    }

    /// Resolve a bullet class name.
    pub fn bullet_id(&self, name: &str) -> Option<BulletClassId> {
        self.bullet_names.get(name).copied()
    }

    /// Resolve a gun name.
    pub fn gun_id(&self, name: &str) -> Option<GunId> {
        self.gun_names.get(name).copied()
    }

    /// Is this a valid bullet class id?
    pub fn has_bullet(&self, id: BulletClassId) -> bool {
        (id.0 as usize) < self.bullets.len()
    }

    /// Is this a valid gun id?
    pub fn has_gun(&self, id: GunId) -> bool {
        (id.0 as usize) < self.guns.len()
    }

    /// Number of bullet classes.
    pub fn bullet_count(&self) -> usize {
        self.bullets.len()
    }

    /// Number of guns.
    pub fn gun_count(&self) -> usize {
        self.guns.len()
    }
}

fn check_range(source_name: &str, name: &str, field: &'static str, pair: [i32; 2]) -> Result<(), ConfigError> {
    if pair[0] > pair[1] {
        return Err(ConfigError::InvertedRange {
            source_name: source_name.to_string(),
            name: name.to_string(),
            field,
            low: pair[0],
            high: pair[1],
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads() {
        let registry = ClassRegistry::builtin().unwrap();
        let rifle = registry.gun_id("rifle").unwrap();
        let bullet = registry.bullet(registry.gun(rifle).bullet);
        assert_eq!(bullet.name, "rifle_round");
        assert!(registry.gun_id("grenade_launcher").is_some());
        assert!(registry.bullet_id("grenade").and_then(|id| registry.bullet(id).falling.clone()).is_some());
    }

    #[test]
    fn test_sub_gun_references_resolve() {
        let json = r#"{
            "bullets": [
                { "name": "shell", "speed": [256, 256], "range": [10, 10], "hit_guns": ["burst"] },
                { "name": "shard", "speed": [128, 192], "range": [4, 8] }
            ],
            "guns": [
                { "name": "cannon", "bullet": "shell" },
                { "name": "burst", "bullet": "shard", "count": 4, "spread_width": 90 }
            ]
        }"#;
        let registry = ClassRegistry::from_json_str(json, "inline").unwrap();
        let shell = registry.bullet(registry.bullet_id("shell").unwrap());
        assert_eq!(shell.hit_guns, vec![registry.gun_id("burst").unwrap()]);
        assert!(shell.hits_objects);
        assert_eq!(shell.mass, 1);
        assert_eq!(shell.half_size, FullVec2::from_pixels(1, 1));
    }

    #[test]
    fn test_unknown_bullet_reports_asset_and_file() {
        let json = r#"{ "guns": [ { "name": "pistol", "bullet": "missing" } ] }"#;
        let err = ClassRegistry::from_json_str(json, "weapons.json").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("weapons.json"));
        assert!(msg.contains("pistol"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn test_unknown_sub_gun() {
        let json = r#"{ "bullets": [
            { "name": "b", "speed": [1, 1], "range": [1, 1], "proximity_guns": ["nowhere"] }
        ] }"#;
        let err = ClassRegistry::from_json_str(json, "x.json").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownGun { ref gun, .. } if gun == "nowhere"));
    }

    #[test]
    fn test_duplicate_and_inverted() {
        let dup = r#"{ "bullets": [
            { "name": "b", "speed": [1, 1], "range": [1, 1] },
            { "name": "b", "speed": [1, 1], "range": [1, 1] }
        ] }"#;
        assert!(matches!(
            ClassRegistry::from_json_str(dup, "x").unwrap_err(),
            ConfigError::DuplicateName { kind: "bullet", .. }
        ));

        let inverted = r#"{ "bullets": [ { "name": "b", "speed": [9, 1], "range": [1, 1] } ] }"#;
        assert!(matches!(
            ClassRegistry::from_json_str(inverted, "x").unwrap_err(),
            ConfigError::InvertedRange { field: "speed", low: 9, high: 1, .. }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = ClassRegistry::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
