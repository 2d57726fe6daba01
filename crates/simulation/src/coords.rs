//! Map coordinate types and quarter-turn rotation math.
//!
//! World coordinates are in world units (32 per tile edge, 8 per height
//! step); tile coordinates address whole tiles. All rotations in the map are
//! quarter turns, represented by [`Direction`].

use crate::config::COORDS_XY_STEP;

/// One of the four cardinal orientations a map element can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
}

impl Direction {
    pub fn from_u8(value: u8) -> Self {
        match value & 3 {
            0 => Direction::North,
            1 => Direction::East,
            2 => Direction::South,
            _ => Direction::West,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    /// The rotation that undoes this one: `d.rotated by d.inverse()` is a
    /// net zero turn.
    pub fn inverse(self) -> Self {
        Self::from_u8((4 - self.as_u8()) & 3)
    }

    /// `self - other`, modulo four quarter turns.
    pub fn wrapping_sub(self, other: Direction) -> Self {
        Self::from_u8(self.as_u8().wrapping_sub(other.as_u8()) & 3)
    }
}

/// A position in world units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CoordsXY {
    pub x: i32,
    pub y: i32,
}

impl CoordsXY {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Rotate around the origin by quarter turns:
    /// one turn maps `(x, y)` to `(-y, x)`, two to `(-x, -y)`, three to
    /// `(y, -x)`.
    pub fn rotated(self, rotation: Direction) -> Self {
        match rotation {
            Direction::North => self,
            Direction::East => Self::new(-self.y, self.x),
            Direction::South => Self::new(-self.x, -self.y),
            Direction::West => Self::new(self.y, -self.x),
        }
    }

    pub fn to_tile(self) -> TileCoordsXY {
        TileCoordsXY::new(self.x / COORDS_XY_STEP, self.y / COORDS_XY_STEP)
    }
}

/// A position in world units, with height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CoordsXYZ {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CoordsXYZ {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn xy(self) -> CoordsXY {
        CoordsXY::new(self.x, self.y)
    }
}

/// A tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileCoordsXY {
    pub x: i32,
    pub y: i32,
}

impl TileCoordsXY {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn world(self) -> CoordsXY {
        CoordsXY::new(self.x * COORDS_XY_STEP, self.y * COORDS_XY_STEP)
    }
}

/// A tile address with height, in height steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileCoordsXYZ {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TileCoordsXYZ {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn xy(self) -> TileCoordsXY {
        TileCoordsXY::new(self.x, self.y)
    }
}

/// A tile address with height and orientation, used for ride entrance and
/// exit placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileCoordsXYZD {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub direction: Direction,
}

impl TileCoordsXYZD {
    pub fn new(x: i32, y: i32, z: i32, direction: Direction) -> Self {
        Self { x, y, z, direction }
    }

    pub fn xy(self) -> TileCoordsXY {
        TileCoordsXY::new(self.x, self.y)
    }
}
