//! Target Finding
//!
//! The slice of AI the combat core needs: seeking bullets ask for the
//! nearest actor they would be allowed to damage.

use crate::core::vec2::FullVec2;
use crate::game::actor::Actor;
use crate::game::bullet::BulletFlags;
use crate::game::bullet_class::SpecialDamage;
use crate::game::config::SimConfig;
use crate::game::damage::can_damage_character;
use crate::game::pool::Pool;

/// Position of the closest actor the source could damage.
///
/// Squared distance decides; equal distances go to the lower slot. `None`
/// when nothing qualifies, in which case callers keep flying straight.
pub fn find_closest_enemy(
    actors: &Pool<Actor>,
    pos: FullVec2,
    owner_uid: Option<u32>,
    flags: BulletFlags,
    special: SpecialDamage,
    config: &SimConfig,
) -> Option<FullVec2> {
    let mut best: Option<(i64, FullVec2)> = None;
    for (_, actor) in actors.iter() {
        if !can_damage_character(flags, owner_uid, actor, special, config) {
            continue;
        }
        let d = actor.thing.pos.distance_squared(pos);
        if best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, actor.thing.pos));
        }
    }
    best.map(|(_, p)| p)
}
