//! Live tiles and the position function.
//!
//! Positions are never stored: a tile's y is a pure function of the time
//! since it spawned, so variable frame deltas cannot accumulate drift.

use crate::rules::FieldGeometry;
use crate::Millis;

pub type TileId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Tap,
    Hold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub lane: u8,
    pub spawn_ms: Millis,
    /// When the tile crosses the hit line.
    pub arrival_ms: Millis,
    /// 0 for tap tiles.
    pub hold_ms: Millis,
    /// Hold tiles only: the lane is currently pressed on this tile.
    held: bool,
}

impl Tile {
    pub fn kind(&self) -> TileKind {
        if self.hold_ms > 0.0 {
            TileKind::Hold
        } else {
            TileKind::Tap
        }
    }

    pub fn is_hold(&self) -> bool {
        self.kind() == TileKind::Hold
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn hold_end_ms(&self) -> Millis {
        self.arrival_ms + self.hold_ms
    }

    /// When a held tile counts as completed: `window` before the hold ends,
    /// but never before the tile has arrived.
    pub fn completion_ms(&self, window: Millis) -> Millis {
        (self.hold_end_ms() - window).max(self.arrival_ms)
    }

    pub fn travel_ms(&self) -> Millis {
        self.arrival_ms - self.spawn_ms
    }

    /// Pixels per millisecond, derived from the travel time and distance.
    pub fn speed(&self, geometry: &FieldGeometry) -> f64 {
        let travel = self.travel_ms();
        if travel > 0.0 {
            geometry.travel_distance() / travel
        } else {
            0.0
        }
    }

    /// Leading-edge y at song time `t`.
    pub fn position(&self, geometry: &FieldGeometry, t: Millis) -> f64 {
        geometry.spawn_y + self.speed(geometry) * (t - self.spawn_ms)
    }

    /// Length of the hold body in pixels.
    pub fn hold_length_px(&self, geometry: &FieldGeometry) -> f64 {
        self.speed(geometry) * self.hold_ms
    }

    /// Signed timing offset of `t` against arrival (positive = late).
    pub fn offset(&self, t: Millis) -> Millis {
        t - self.arrival_ms
    }

    pub fn is_judgeable(&self, t: Millis, window: Millis) -> bool {
        self.offset(t).abs() < window
    }

    /// The arrival window has fully passed.
    pub fn is_overdue(&self, t: Millis, window: Millis) -> bool {
        self.offset(t) >= window
    }

    /// Within the highlight band just above the hit line. Visual only.
    pub fn is_near(&self, geometry: &FieldGeometry, t: Millis) -> bool {
        let y = self.position(geometry, t);
        y > geometry.hit_line_y - geometry.near_band_px && y < geometry.hit_line_y
    }
}

/// Read-only view of a tile for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileView {
    pub id: TileId,
    pub lane: u8,
    pub y: f64,
    pub hold_length_px: f64,
    pub held: bool,
    pub near: bool,
}

#[derive(Debug, Clone)]
pub struct TileField {
    /// Sorted by id, which is also spawn order.
    tiles: Vec<Tile>,
    next_id: TileId,
}

impl TileField {
    pub fn new() -> Self {
        Self {
            tiles: Vec::new(),
            next_id: 1,
        }
    }

    pub fn spawn(&mut self, lane: u8, spawn_ms: Millis, arrival_ms: Millis, hold_ms: Millis) -> TileId {
        let id = self.next_id;
        self.next_id += 1;
        self.tiles.push(Tile {
            id,
            lane,
            spawn_ms,
            arrival_ms,
            hold_ms: hold_ms.max(0.0),
            held: false,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn remove(&mut self, id: TileId) -> Option<Tile> {
        let index = self.tiles.iter().position(|t| t.id == id)?;
        Some(self.tiles.remove(index))
    }

    pub fn set_held(&mut self, id: TileId, held: bool) {
        if let Some(tile) = self.tiles.iter_mut().find(|t| t.id == id) {
            tile.held = held && tile.is_hold();
        }
    }

    pub fn live_in_lane(&self, lane: u8) -> usize {
        self.tiles.iter().filter(|t| t.lane == lane).count()
    }

    /// The earliest-arriving tile in `lane` that input at `t` can resolve.
    /// Held tiles are already resolved into the hold phase and are skipped.
    pub fn judgeable_in_lane(&self, lane: u8, t: Millis, window: Millis) -> Option<&Tile> {
        self.tiles
            .iter()
            .filter(|tile| tile.lane == lane && !tile.held && tile.is_judgeable(t, window))
            .min_by(|a, b| a.arrival_ms.total_cmp(&b.arrival_ms))
    }

    /// The hold tile currently pressed in `lane`, if any.
    pub fn held_in_lane(&self, lane: u8) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.lane == lane && tile.held)
    }

    /// A hold tile in `lane` is still live when a tile arriving at
    /// `arrival_ms` would become judgeable.
    pub fn hold_blocks_lane(&self, lane: u8, arrival_ms: Millis, window: Millis) -> bool {
        self.tiles
            .iter()
            .any(|tile| tile.lane == lane && tile.is_hold() && tile.completion_ms(window) > arrival_ms - window)
    }

    pub fn snapshot(&self, geometry: &FieldGeometry, t: Millis) -> Vec<TileView> {
        self.tiles
            .iter()
            .map(|tile| TileView {
                id: tile.id,
                lane: tile.lane,
                y: tile.position(geometry, t),
                hold_length_px: tile.hold_length_px(geometry),
                held: tile.held,
                near: tile.is_near(geometry, t),
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}

impl Default for TileField {
    fn default() -> Self {
        Self::new()
    }
}
