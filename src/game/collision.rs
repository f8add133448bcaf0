//! Collision Detection
//!
//! Swept axis-aligned box tests for bullets against walls, actors and
//! objects. Everything is integer: slab entry and exit times are exact
//! rationals compared by cross-multiplication, so two machines always agree
//! on which contact came first.
//!
//! Candidate order is part of the result. Tiles are scanned rows then
//! columns in the direction of travel, each tile's wall before its bucket,
//! bucket in insertion order. The closest candidate wins and the first one
//! found wins a tie.

use std::cmp::Ordering;

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Full, FULL_ONE, TILE_WIDTH_FULL, TILE_HEIGHT_FULL};
use crate::core::vec2::FullVec2;
use crate::game::actor::Actor;
use crate::game::bullet::BulletFlags;
use crate::game::config::HitLockPolicy;
use crate::game::damage::can_hit;
use crate::game::map::TileMap;
use crate::game::object::MapObject;
use crate::game::pool::Pool;
use crate::game::thing::{Thing, ThingId, ThingKind};

/// What a sweep ran into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitType {
    /// Nothing
    #[default]
    None,
    /// Shot-blocking tile
    Wall,
    /// Map object
    Object,
    /// Actor
    Flesh,
}

// =============================================================================
// SWEPT BOX
// =============================================================================

/// Non-negative-denominator fraction.
#[derive(Clone, Copy, Debug)]
struct Frac {
    num: i64,
    den: i64,
}

impl Frac {
    const ZERO: Frac = Frac { num: 0, den: 1 };
    const ONE: Frac = Frac { num: 1, den: 1 };

    fn new(num: i64, den: i64) -> Self {
        if den < 0 {
            Self { num: -num, den: -den }
        } else {
            Self { num, den }
        }
    }

    fn cmp(self, other: Frac) -> Ordering {
        (self.num as i128 * other.den as i128).cmp(&(other.num as i128 * self.den as i128))
    }

    fn lt(self, other: Frac) -> bool {
        self.cmp(other) == Ordering::Less
    }

    fn min(self, other: Frac) -> Frac {
        if other.lt(self) { other } else { self }
    }

    /// `value * self`, truncated toward zero.
    fn scale(self, value: Full) -> Full {
        (value as i64 * self.num / self.den) as Full
    }
}

/// Overlap window of one axis.
#[derive(Clone, Copy, Debug)]
enum AxisSpan {
    /// Static and overlapping for the whole sweep
    Always,
    /// Overlaps between the two times
    Window(Frac, Frac),
}

fn axis_span(start: Full, delta: Full, lo: Full, hi: Full) -> Option<AxisSpan> {
    if delta == 0 {
        return if start > lo && start < hi { Some(AxisSpan::Always) } else { None };
    }
    let to_lo = Frac::new((lo - start) as i64, delta as i64);
    let to_hi = Frac::new((hi - start) as i64, delta as i64);
    Some(if delta > 0 {
        AxisSpan::Window(to_lo, to_hi)
    } else {
        AxisSpan::Window(to_hi, to_lo)
    })
}

/// First contact of a moving box with a static one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepHit {
    /// Mover center at contact
    pub pos: FullVec2,
    /// Surface normal, `FULL_ONE` per contact axis
    pub normal: FullVec2,
    /// The boxes already overlapped at the start; `normal` then points out
    /// through the nearest face
    pub embedded: bool,
}

/// Normal of the face of `[min, max]` nearest to `p`. Equal depths on both
/// axes give a diagonal.
fn push_out_normal(p: FullVec2, min: FullVec2, max: FullVec2) -> FullVec2 {
    let nearest = |v: Full, lo: Full, hi: Full| {
        if v - lo <= hi - v { (v - lo, -FULL_ONE) } else { (hi - v, FULL_ONE) }
    };
    let (depth_x, nx) = nearest(p.x, min.x, max.x);
    let (depth_y, ny) = nearest(p.y, min.y, max.y);
    match depth_x.cmp(&depth_y) {
        Ordering::Less => FullVec2::new(nx, 0),
        Ordering::Greater => FullVec2::new(0, ny),
        Ordering::Equal => FullVec2::new(nx, ny),
    }
}

/// Sweep a box of `mover_half` extents from `start` by `delta` against the
/// box at `center` with `half` extents.
///
/// Contact requires strict overlap: boxes that only share an edge for the
/// whole move do not collide. When both axes are entered at the same
/// instant the normal has both components set. A mover that starts inside
/// the box reports contact at `start` with `embedded` set.
pub fn sweep_box(
    start: FullVec2,
    delta: FullVec2,
    mover_half: FullVec2,
    center: FullVec2,
    half: FullVec2,
) -> Option<SweepHit> {
    let min = center - half - mover_half;
    let max = center + half + mover_half;

    let span_x = axis_span(start.x, delta.x, min.x, max.x)?;
    let span_y = axis_span(start.y, delta.y, min.y, max.y)?;

    let normal_x = FullVec2::new(-delta.x.signum() * FULL_ONE, 0);
    let normal_y = FullVec2::new(0, -delta.y.signum() * FULL_ONE);

    let (enter, exit, normal) = match (span_x, span_y) {
        (AxisSpan::Always, AxisSpan::Always) => {
            return Some(SweepHit { pos: start, normal: push_out_normal(start, min, max), embedded: true });
        }
        (AxisSpan::Window(enter, exit), AxisSpan::Always) => (enter, exit, normal_x),
        (AxisSpan::Always, AxisSpan::Window(enter, exit)) => (enter, exit, normal_y),
        (AxisSpan::Window(enter_x, exit_x), AxisSpan::Window(enter_y, exit_y)) => {
            let (enter, normal) = match enter_x.cmp(enter_y) {
                Ordering::Greater => (enter_x, normal_x),
                Ordering::Less => (enter_y, normal_y),
                Ordering::Equal => (enter_x, normal_x + normal_y),
            };
            (enter, exit_x.min(exit_y), normal)
        }
    };

    if !(enter.lt(exit) && enter.lt(Frac::ONE) && Frac::ZERO.lt(exit)) {
        return None;
    }
    if enter.lt(Frac::ZERO) {
        return Some(SweepHit { pos: start, normal: push_out_normal(start, min, max), embedded: true });
    }

    Some(SweepHit {
        pos: FullVec2::new(start.x + enter.scale(delta.x), start.y + enter.scale(delta.y)),
        normal,
        embedded: false,
    })
}

// =============================================================================
// CANDIDATES
// =============================================================================

/// One potential contact along a sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Wall, Object or Flesh
    pub hit_type: HitType,
    /// Target for Object/Flesh
    pub target: Option<ThingId>,
    /// Mover center at contact
    pub pos: FullVec2,
    /// Surface normal
    pub normal: FullVec2,
    /// Squared distance from the sweep start
    pub distance_sq: i64,
    /// Target was under a hit lock
    pub locked: bool,
}

/// A bullet sweep to resolve.
#[derive(Clone, Copy, Debug)]
pub struct HitQuery {
    /// Current center
    pub start: FullVec2,
    /// Tentative center after this tick
    pub end: FullVec2,
    /// Bullet half extents
    pub half_size: FullVec2,
    /// Bullet flags (HURT_ALWAYS bypasses the owner guard)
    pub flags: BulletFlags,
    /// Firing actor
    pub owner_uid: Option<u32>,
    /// Pass-through bullet: every target is hit, not just the closest
    pub multi: bool,
    /// Hit lock semantics
    pub lock_policy: HitLockPolicy,
}

/// Outcome of [`resolve_hits`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HitResolution {
    /// Contact that decides the bullet's fate
    pub hit: Option<Candidate>,
    /// Targets to damage, in the order they were found
    pub targets: Vec<Candidate>,
}

impl HitResolution {
    /// Type of the deciding contact.
    pub fn hit_type(&self) -> HitType {
        self.hit.map_or(HitType::None, |c| c.hit_type)
    }
}

fn hittable(
    actors: &Pool<Actor>,
    objects: &Pool<MapObject>,
    id: ThingId,
    query: &HitQuery,
) -> Option<(Thing, HitType)> {
    match id.kind {
        ThingKind::Character => actors
            .get(id)
            .filter(|a| can_hit(query.flags, query.owner_uid, a))
            .map(|a| (a.thing, HitType::Flesh)),
        ThingKind::Object => objects.get(id).map(|o| (o.thing, HitType::Object)),
        ThingKind::Bullet => None,
    }
}

/// Every contact along the sweep, in scan order.
pub fn find_candidates(
    map: &TileMap,
    actors: &Pool<Actor>,
    objects: &Pool<MapObject>,
    query: &HitQuery,
) -> Vec<Candidate> {
    let delta = query.end - query.start;
    let margin = FullVec2::new(TILE_WIDTH_FULL, TILE_HEIGHT_FULL) + query.half_size;
    let lo = FullVec2::new(query.start.x.min(query.end.x), query.start.y.min(query.end.y)) - margin;
    let hi = FullVec2::new(query.start.x.max(query.end.x), query.start.y.max(query.end.y)) + margin;

    let mut out = Vec::new();
    for tile in map.tiles_in_rect(lo, hi, delta) {
        if map.blocks_shots(tile) {
            let (center, half) = TileMap::tile_box(tile);
            let hit = sweep_box(query.start, delta, query.half_size, center, half)
                .filter(|hit| !hit.embedded || heads_into(delta, hit.normal));
            if let Some(hit) = hit {
                out.push(Candidate {
                    hit_type: HitType::Wall,
                    target: None,
                    pos: hit.pos,
                    normal: hit.normal,
                    distance_sq: hit.pos.distance_squared(query.start),
                    locked: false,
                });
            }
        }

        for &id in map.things_at(tile) {
            let Some((thing, hit_type)) = hittable(actors, objects, id, query) else {
                continue;
            };
            if let Some(hit) = sweep_box(query.start, delta, query.half_size, thing.pos, thing.half_size) {
                out.push(Candidate {
                    hit_type,
                    target: Some(id),
                    pos: hit.pos,
                    normal: hit.normal,
                    distance_sq: hit.pos.distance_squared(query.start),
                    locked: thing.is_hit_locked(),
                });
            }
        }
    }
    out
}

/// A mover already inside a wall only collides with it while still pushing
/// deeper; otherwise it is left to fly out.
fn heads_into(delta: FullVec2, normal: FullVec2) -> bool {
    (delta.x as i64) * (normal.x as i64) + (delta.y as i64) * (normal.y as i64) < 0
}

/// Closest candidate; earliest in the slice on a tie.
pub fn closest<'a, I>(candidates: I) -> Option<&'a Candidate>
where
    I: IntoIterator<Item = &'a Candidate>,
{
    let mut best: Option<&Candidate> = None;
    for c in candidates {
        if best.map_or(true, |b| c.distance_sq < b.distance_sq) {
            best = Some(c);
        }
    }
    best
}

/// Decide what a bullet sweep hits.
///
/// Single mode: the closest candidate decides, and is the only target.
/// Multi mode: every target up to the closest wall is hit in scan order;
/// the wall (or failing that the first target) decides.
///
/// Under [`HitLockPolicy::SuppressHit`] locked targets are dropped before
/// anything else, so the sweep behaves as though they were not there.
pub fn resolve_hits(
    map: &TileMap,
    actors: &Pool<Actor>,
    objects: &Pool<MapObject>,
    query: &HitQuery,
) -> HitResolution {
    let mut candidates = find_candidates(map, actors, objects, query);
    if query.lock_policy == HitLockPolicy::SuppressHit {
        candidates.retain(|c| !c.locked);
    }

    if !query.multi {
        let Some(best) = closest(&candidates).copied() else {
            return HitResolution::default();
        };
        let targets = if best.target.is_some() { vec![best] } else { Vec::new() };
        return HitResolution { hit: Some(best), targets };
    }

    let wall = closest(candidates.iter().filter(|c| c.hit_type == HitType::Wall)).copied();
    let limit = wall.map(|w| w.distance_sq);
    let targets: Vec<Candidate> = candidates
        .iter()
        .filter(|c| c.target.is_some() && limit.map_or(true, |l| c.distance_sq <= l))
        .copied()
        .collect();
    let hit = wall.or_else(|| targets.first().copied());
    HitResolution { hit, targets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::actor::{ActorFlags, ActorSpec};
    use crate::game::object::ObjectSpec;

    fn px(x: i32, y: i32) -> FullVec2 {
        FullVec2::from_pixels(x, y)
    }

    #[test]
    fn test_sweep_box_head_on() {
        // Mover 2px wide heading right into a box whose left face is at x=20
        let hit = sweep_box(px(10, 5), px(20, 0), px(1, 1), px(24, 5), px(4, 4)).unwrap();
        assert_eq!(hit.pos, px(19, 5));
        assert_eq!(hit.normal, FullVec2::new(-FULL_ONE, 0));
    }

    #[test]
    fn test_sweep_box_miss() {
        assert!(sweep_box(px(0, 0), px(4, 0), px(1, 1), px(24, 0), px(4, 4)).is_none());
        // Parallel and only touching the edge
        assert!(sweep_box(px(0, 5), px(40, 0), px(1, 1), px(20, 0), px(4, 4)).is_none());
    }

    #[test]
    fn test_sweep_box_diagonal_tie() {
        let hit = sweep_box(px(0, 0), px(20, 20), px(1, 1), px(15, 15), px(4, 4)).unwrap();
        assert_eq!(hit.pos, px(10, 10));
        assert_eq!(hit.normal, FullVec2::new(-FULL_ONE, -FULL_ONE));
    }

    #[test]
    fn test_sweep_box_already_inside() {
        // Expanded box spans 15..25 on both axes; the left face is nearest
        let hit = sweep_box(px(17, 21), px(4, 0), px(1, 1), px(20, 20), px(4, 4)).unwrap();
        assert_eq!(hit.pos, px(17, 21));
        assert!(hit.embedded);
        assert_eq!(hit.normal, FullVec2::new(-FULL_ONE, 0));

        // Dead center: both faces equally near
        let hit = sweep_box(px(20, 20), FullVec2::ZERO, px(1, 1), px(20, 20), px(4, 4)).unwrap();
        assert!(hit.embedded);
        assert_eq!(hit.normal, FullVec2::new(-FULL_ONE, -FULL_ONE));
    }

    fn setup(rows: &[&str]) -> (TileMap, Pool<Actor>, Pool<MapObject>) {
        (
            TileMap::from_rows(rows).unwrap(),
            Pool::with_capacity(ThingKind::Character, 4),
            Pool::with_capacity(ThingKind::Object, 4),
        )
    }

    fn add_actor(map: &mut TileMap, actors: &mut Pool<Actor>, uid: u32, pos: FullVec2) -> ThingId {
        let actor = Actor::from_spec(&ActorSpec {
            uid,
            player_uid: None,
            flags: ActorFlags::empty(),
            health: 10,
            pos,
        });
        let id = actors.alloc(actor);
        map.insert(id, pos);
        id
    }

    fn add_object(map: &mut TileMap, objects: &mut Pool<MapObject>, uid: u32, pos: FullVec2) -> ThingId {
        let object = MapObject::from_spec(&ObjectSpec { uid, health: Some(5), pos, half_size: px(3, 3) });
        let id = objects.alloc(object);
        map.insert(id, pos);
        id
    }

    fn query(start: FullVec2, end: FullVec2) -> HitQuery {
        HitQuery {
            start,
            end,
            half_size: px(1, 1),
            flags: BulletFlags::empty(),
            owner_uid: Some(1),
            multi: false,
            lock_policy: HitLockPolicy::SuppressHit,
        }
    }

    #[test]
    fn test_wall_hit() {
        let (map, actors, objects) = setup(&["......#."]);
        let res = resolve_hits(&map, &actors, &objects, &query(px(80, 6), px(100, 6)));
        let hit = res.hit.unwrap();
        assert_eq!(hit.hit_type, HitType::Wall);
        assert_eq!(hit.pos, px(95, 6));
        assert!(res.targets.is_empty());
    }

    #[test]
    fn test_embedded_wall_only_blocks_deeper_movement() {
        // Wall face at x=64px; the bullet box already pokes half a pixel in
        let (map, actors, objects) = setup(&["....#..."]);
        let start = FullVec2::new(px(63, 6).x + FULL_ONE / 2, px(0, 6).y);

        let res = resolve_hits(&map, &actors, &objects, &query(start, start + px(4, 0)));
        let hit = res.hit.unwrap();
        assert_eq!(hit.hit_type, HitType::Wall);
        assert_eq!(hit.pos, start);
        assert_eq!(hit.normal, FullVec2::new(-FULL_ONE, 0));

        // Backing out, or sitting still, is free
        assert_eq!(resolve_hits(&map, &actors, &objects, &query(start, start - px(4, 0))).hit, None);
        assert_eq!(resolve_hits(&map, &actors, &objects, &query(start, start)).hit, None);
    }

    #[test]
    fn test_stationary_sweep_hits_overlapped_actor() {
        let (mut map, mut actors, objects) = setup(&["........"]);
        let id = add_actor(&mut map, &mut actors, 2, px(40, 6));
        let res = resolve_hits(&map, &actors, &objects, &query(px(40, 6), px(40, 6)));
        assert_eq!(res.hit_type(), HitType::Flesh);
        assert_eq!(res.targets[0].target, Some(id));
    }

    #[test]
    fn test_owner_is_skipped_unless_hurt_always() {
        let (mut map, mut actors, objects) = setup(&["........"]);
        add_actor(&mut map, &mut actors, 1, px(40, 6));

        let q = query(px(20, 6), px(60, 6));
        assert_eq!(resolve_hits(&map, &actors, &objects, &q).hit, None);

        let q = HitQuery { flags: BulletFlags::HURT_ALWAYS, ..q };
        let res = resolve_hits(&map, &actors, &objects, &q);
        assert_eq!(res.hit_type(), HitType::Flesh);
        assert_eq!(res.targets.len(), 1);
    }

    #[test]
    fn test_closest_wins_and_tie_goes_to_first_found() {
        let (mut map, mut actors, mut objects) = setup(&["........"]);
        let near = add_object(&mut map, &mut objects, 10, px(40, 6));
        let _far = add_actor(&mut map, &mut actors, 2, px(60, 6));
        let res = resolve_hits(&map, &actors, &objects, &query(px(20, 6), px(70, 6)));
        assert_eq!(res.hit.unwrap().target, Some(near));

        // Two objects at the same spot: insertion order decides
        let (mut map, actors, mut objects) = setup(&["........"]);
        let first = add_object(&mut map, &mut objects, 10, px(40, 6));
        let _second = add_object(&mut map, &mut objects, 11, px(40, 6));
        let res = resolve_hits(&map, &actors, &objects, &query(px(20, 6), px(70, 6)));
        assert_eq!(res.hit.unwrap().target, Some(first));
    }

    #[test]
    fn test_multi_hits_everything_before_the_wall() {
        let (mut map, mut actors, mut objects) = setup(&["......#."]);
        let a = add_actor(&mut map, &mut actors, 2, px(40, 6));
        let o = add_object(&mut map, &mut objects, 10, px(70, 6));
        let _behind = add_actor(&mut map, &mut actors, 3, px(120, 6));

        let q = HitQuery { multi: true, ..query(px(20, 6), px(125, 6)) };
        let res = resolve_hits(&map, &actors, &objects, &q);
        assert_eq!(res.hit_type(), HitType::Wall);
        let hit_ids: Vec<_> = res.targets.iter().filter_map(|c| c.target).collect();
        assert_eq!(hit_ids, vec![a, o]);
    }

    #[test]
    fn test_hit_lock_policies() {
        let (mut map, mut actors, objects) = setup(&["........"]);
        let id = add_actor(&mut map, &mut actors, 2, px(40, 6));
        actors.get_mut(id).unwrap().thing.hit_lock = 5;

        let q = query(px(20, 6), px(60, 6));
        assert_eq!(resolve_hits(&map, &actors, &objects, &q).hit, None);

        let q = HitQuery { lock_policy: HitLockPolicy::SoundOnly, ..q };
        let res = resolve_hits(&map, &actors, &objects, &q);
        assert!(res.hit.unwrap().locked);
    }
}
