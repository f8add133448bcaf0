//! Tile Map and Spatial Index
//!
//! Fixed grid of 16x12 pixel tiles. Each tile carries its static geometry
//! and an ordered bucket of [`ThingId`]s for everything whose center is in
//! it. Buckets keep insertion order, which is part of the collision scan
//! order and therefore of the hit tie-break.
//!
//! ```text
//!   col →  0   1   2   3
//!  row 0  [#] [#] [#] [#]
//!  row 1  [#] [.] [.] [#]      '#' blocks shots and movement
//!  row 2  [#] [#] [#] [#]      '.' open floor
//! ```

use crate::core::fixed::{TILE_WIDTH_FULL, TILE_HEIGHT_FULL};
use crate::core::vec2::{FullVec2, TileCoord};
use crate::game::config::ConfigError;
use crate::game::thing::ThingId;

/// Static tile geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    /// Bullets collide with it
    pub blocks_shots: bool,
    /// Actors cannot enter it
    pub blocks_movement: bool,
}

impl Tile {
    const FLOOR: Tile = Tile { blocks_shots: false, blocks_movement: false };
    const WALL: Tile = Tile { blocks_shots: true, blocks_movement: true };
}

/// Tile grid plus per-tile thing buckets.
#[derive(Clone, Debug)]
pub struct TileMap {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    buckets: Vec<Vec<ThingId>>,
}

impl TileMap {
    /// Build from text rows: `#` wall, `.` floor. All rows must be the same width.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, ConfigError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().chars().count()).unwrap_or(0);
        if width == 0 {
            return Err(ConfigError::InvalidMap { row: 0, reason: "map is empty".into() });
        }

        let mut tiles = Vec::with_capacity(width * height);
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            if line.chars().count() != width {
                return Err(ConfigError::InvalidMap {
                    row,
                    reason: format!("expected {} tiles, found {}", width, line.chars().count()),
                });
            }
            for c in line.chars() {
                tiles.push(match c {
                    '#' => Tile::WALL,
                    '.' => Tile::FLOOR,
                    other => {
                        return Err(ConfigError::InvalidMap {
                            row,
                            reason: format!("unknown tile '{}'", other),
                        })
                    }
                });
            }
        }

        Ok(Self {
            width: width as i32,
            height: height as i32,
            buckets: vec![Vec::new(); tiles.len()],
            tiles,
        })
    }

    /// Width in tiles.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Is the tile inside the map?
    #[inline]
    pub fn in_bounds(&self, t: TileCoord) -> bool {
        t.x >= 0 && t.y >= 0 && t.x < self.width && t.y < self.height
    }

    #[inline]
    fn index(&self, t: TileCoord) -> Option<usize> {
        if self.in_bounds(t) {
            Some((t.y * self.width + t.x) as usize)
        } else {
            None
        }
    }

    /// Tile geometry, `None` outside the map.
    pub fn tile(&self, t: TileCoord) -> Option<&Tile> {
        self.index(t).map(|i| &self.tiles[i])
    }

    /// Does the tile stop bullets? Outside the map is open; movement there
    /// is rejected by [`TileMap::try_move_thing`] instead.
    #[inline]
    pub fn blocks_shots(&self, t: TileCoord) -> bool {
        self.tile(t).is_some_and(|tile| tile.blocks_shots)
    }

    /// Does the tile stop actors? Outside the map counts as blocked.
    #[inline]
    pub fn blocks_movement(&self, t: TileCoord) -> bool {
        self.tile(t).map_or(true, |tile| tile.blocks_movement)
    }

    /// Center and half extents of a tile in full coordinates.
    pub fn tile_box(t: TileCoord) -> (FullVec2, FullVec2) {
        (t.center(), FullVec2::new(TILE_WIDTH_FULL / 2, TILE_HEIGHT_FULL / 2))
    }

    /// Things filed under a tile, in insertion order.
    pub fn things_at(&self, t: TileCoord) -> &[ThingId] {
        match self.index(t) {
            Some(i) => &self.buckets[i],
            None => &[],
        }
    }

    /// File a thing under the tile containing `pos`. False if outside the map.
    pub fn insert(&mut self, id: ThingId, pos: FullVec2) -> bool {
        match self.index(pos.to_tile()) {
            Some(i) => {
                self.buckets[i].push(id);
                true
            }
            None => false,
        }
    }

    /// Remove a thing filed at `pos`.
    pub fn remove(&mut self, id: ThingId, pos: FullVec2) {
        if let Some(i) = self.index(pos.to_tile()) {
            self.buckets[i].retain(|t| *t != id);
        }
    }

    /// Move a thing's filing from `from` to `to`.
    ///
    /// Rejected (and nothing changes) when `to` lies outside the map.
    pub fn try_move_thing(&mut self, id: ThingId, from: FullVec2, to: FullVec2) -> bool {
        let (from_tile, to_tile) = (from.to_tile(), to.to_tile());
        let Some(to_index) = self.index(to_tile) else {
            return false;
        };
        if from_tile == to_tile {
            return true;
        }
        if let Some(from_index) = self.index(from_tile) {
            self.buckets[from_index].retain(|t| *t != id);
        }
        self.buckets[to_index].push(id);
        true
    }

    /// Tiles overlapping the rectangle `[min, max]`, clamped to the map.
    ///
    /// Rows then columns, each walked in the direction of `dir` (ascending
    /// when that component is zero). Same inputs, same order.
    pub fn tiles_in_rect(&self, min: FullVec2, max: FullVec2, dir: FullVec2) -> Vec<TileCoord> {
        let lo = min.to_tile();
        let hi = max.to_tile();
        let (x0, x1) = (lo.x.max(0), hi.x.min(self.width - 1));
        let (y0, y1) = (lo.y.max(0), hi.y.min(self.height - 1));
        if x0 > x1 || y0 > y1 {
            return Vec::new();
        }

        let rows: Vec<i32> = if dir.y < 0 { (y0..=y1).rev().collect() } else { (y0..=y1).collect() };
        let cols: Vec<i32> = if dir.x < 0 { (x0..=x1).rev().collect() } else { (x0..=x1).collect() };

        let mut out = Vec::with_capacity(rows.len() * cols.len());
        for &y in &rows {
            for &x in &cols {
                out.push(TileCoord::new(x, y));
            }
        }
        out
    }

    /// Any thing within `radius` tiles of `center` satisfying `pred`.
    pub fn any_thing_near<F>(&self, center: TileCoord, radius: i32, mut pred: F) -> bool
    where
        F: FnMut(ThingId) -> bool,
    {
        for y in center.y - radius..=center.y + radius {
            for x in center.x - radius..=center.x + radius {
                if self.things_at(TileCoord::new(x, y)).iter().any(|id| pred(*id)) {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::thing::ThingKind;

    fn id(slot: u32) -> ThingId {
        ThingId { kind: ThingKind::Character, slot, generation: 0 }
    }

    #[test]
    fn test_from_rows() {
        let map = TileMap::from_rows(&["####", "#..#", "####"]).unwrap();
        assert_eq!((map.width(), map.height()), (4, 3));
        assert!(map.blocks_shots(TileCoord::new(0, 0)));
        assert!(!map.blocks_shots(TileCoord::new(1, 1)));
        assert!(!map.blocks_shots(TileCoord::new(-1, 1)));
        assert!(map.blocks_movement(TileCoord::new(-1, 1)));
    }

    #[test]
    fn test_from_rows_rejects_bad_input() {
        assert!(matches!(
            TileMap::from_rows(&["##", "#"]),
            Err(ConfigError::InvalidMap { row: 1, .. })
        ));
        assert!(matches!(
            TileMap::from_rows(&["#?"]),
            Err(ConfigError::InvalidMap { row: 0, .. })
        ));
        let empty: [&str; 0] = [];
        assert!(TileMap::from_rows(&empty).is_err());
    }

    #[test]
    fn test_insert_move_remove() {
        let mut map = TileMap::from_rows(&["....", "...."]).unwrap();
        let a = FullVec2::from_pixels(8, 6);
        let b = FullVec2::from_pixels(40, 18);
        assert!(map.insert(id(1), a));
        assert_eq!(map.things_at(TileCoord::new(0, 0)), &[id(1)]);

        assert!(map.try_move_thing(id(1), a, b));
        assert!(map.things_at(TileCoord::new(0, 0)).is_empty());
        assert_eq!(map.things_at(TileCoord::new(2, 1)), &[id(1)]);

        // Off the map: rejected, filing unchanged
        assert!(!map.try_move_thing(id(1), b, FullVec2::from_pixels(-4, 18)));
        assert_eq!(map.things_at(TileCoord::new(2, 1)), &[id(1)]);

        map.remove(id(1), b);
        assert!(map.things_at(TileCoord::new(2, 1)).is_empty());
    }

    #[test]
    fn test_bucket_keeps_insertion_order() {
        let mut map = TileMap::from_rows(&["."]).unwrap();
        let p = FullVec2::from_pixels(4, 4);
        map.insert(id(3), p);
        map.insert(id(1), p);
        map.insert(id(2), p);
        assert_eq!(map.things_at(TileCoord::new(0, 0)), &[id(3), id(1), id(2)]);
    }

    #[test]
    fn test_tiles_in_rect_follows_direction() {
        let map = TileMap::from_rows(&["...", "...", "..."]).unwrap();
        let min = FullVec2::from_pixels(0, 0);
        let max = FullVec2::from_pixels(20, 14);

        let forward = map.tiles_in_rect(min, max, FullVec2::new(1, 1));
        assert_eq!(forward, vec![
            TileCoord::new(0, 0), TileCoord::new(1, 0),
            TileCoord::new(0, 1), TileCoord::new(1, 1),
        ]);

        let backward = map.tiles_in_rect(min, max, FullVec2::new(-1, -1));
        assert_eq!(backward, vec![
            TileCoord::new(1, 1), TileCoord::new(0, 1),
            TileCoord::new(1, 0), TileCoord::new(0, 0),
        ]);

        // Clamped to the map
        let clamped = map.tiles_in_rect(FullVec2::from_pixels(-50, -50), FullVec2::from_pixels(1, 1), FullVec2::ZERO);
        assert_eq!(clamped, vec![TileCoord::new(0, 0)]);
    }

    #[test]
    fn test_any_thing_near() {
        let mut map = TileMap::from_rows(&["....", "....", "....", "...."]).unwrap();
        map.insert(id(9), TileCoord::new(3, 3).center());
        assert!(map.any_thing_near(TileCoord::new(2, 2), 1, |_| true));
        assert!(!map.any_thing_near(TileCoord::new(1, 1), 1, |_| true));
        assert!(!map.any_thing_near(TileCoord::new(2, 2), 1, |t| t.slot != 9));
    }
}
