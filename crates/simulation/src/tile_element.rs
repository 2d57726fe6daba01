//! Tile element types: everything that can occupy a map tile.
//!
//! Each element category owns strongly typed fields instead of the legacy
//! bit-packed `type`/`properties` bytes; the save subsystem is responsible
//! for packing these back into the on-disk layouts.

use crate::coords::{Direction, TileCoordsXYZ};
use crate::ride::RideId;

/// Opaque, process-unique identity of a placed tile element.
///
/// Used for selection membership tests; never reused within a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u32);

/// What kind of ride entrance an entrance element is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntranceKind {
    RideEntrance,
    RideExit,
    ParkEntrance,
}

/// A footpath segment.
#[derive(Debug, Clone, PartialEq)]
pub struct PathData {
    /// Path object index in the scenery object registry.
    pub object: u8,
    /// 4-bit connection mask, one bit per edge.
    pub edges: u8,
    pub sloped: bool,
    pub slope_direction: Direction,
    pub is_queue: bool,
    /// The ride this queue path belongs to, when `is_queue` is set.
    pub queue_ride: Option<RideId>,
}

/// A piece of ride track (or one maze cell for maze rides).
#[derive(Debug, Clone, PartialEq)]
pub struct TrackData {
    pub ride: RideId,
    pub track_type: u8,
    pub direction: Direction,
    pub sequence: u8,
    pub colour_scheme: u8,
    pub seat_rotation: u8,
    pub brake_speed: u8,
    pub has_chain: bool,
    pub inverted: bool,
    /// Maze wall bits; meaningful only for maze rides.
    pub maze_entry: u16,
    /// Whether this piece is the canonical start of the ride's track chain.
    pub chain_start: bool,
    /// Link to the next piece of the chain, if any.
    pub chain_next: Option<TileCoordsXYZ>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmallSceneryData {
    pub object: u8,
    pub direction: Direction,
    /// Which quarter of the tile the item occupies (0-3).
    pub quadrant: u8,
    pub primary_colour: u8,
    pub secondary_colour: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WallData {
    pub object: u8,
    pub direction: Direction,
    pub primary_colour: u8,
    pub secondary_colour: u8,
    pub tertiary_colour: u8,
}

/// One tile segment of a multi-tile scenery item. Segments are tied together
/// by sharing an object, direction and sequence numbering that follows the
/// object's tile table.
#[derive(Debug, Clone, PartialEq)]
pub struct LargeSceneryData {
    pub object: u8,
    pub direction: Direction,
    pub sequence: u8,
    pub primary_colour: u8,
    pub secondary_colour: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntranceData {
    pub ride: RideId,
    pub station: u8,
    pub kind: EntranceKind,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileElementData {
    Surface,
    Path(PathData),
    Track(TrackData),
    SmallScenery(SmallSceneryData),
    Wall(WallData),
    LargeScenery(LargeSceneryData),
    Entrance(EntranceData),
}

/// One element placed on a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileElement {
    pub id: ElementId,
    /// Height of the element's base, in height steps.
    pub base_height: u8,
    pub data: TileElementData,
}

impl TileElement {
    pub fn as_track(&self) -> Option<&TrackData> {
        match &self.data {
            TileElementData::Track(track) => Some(track),
            _ => None,
        }
    }

    pub fn as_entrance(&self) -> Option<&EntranceData> {
        match &self.data {
            TileElementData::Entrance(entrance) => Some(entrance),
            _ => None,
        }
    }

    pub fn is_track_for(&self, ride: RideId) -> bool {
        self.as_track().is_some_and(|track| track.ride == ride)
    }
}
