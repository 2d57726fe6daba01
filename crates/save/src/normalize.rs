//! Conversion of world-space placements into the design-relative frame.
//!
//! Every stored coordinate is `(world - origin)` rotated by the inverse of
//! the save direction, then scaled to tile units. The stored fields are
//! signed bytes, so anything outside roughly ±126 tiles is a hard failure,
//! never a clamp.

use simulation::config::{COORDS_XY_STEP, COORDS_Z_STEP};
use simulation::coords::{CoordsXY, CoordsXYZ, Direction};

use crate::save_error::SaveError;

/// Inclusive bounds of the stored signed-byte coordinate range.
const STORED_MIN: i32 = -126;
const STORED_MAX: i32 = 127;

/// The translation and rotation reference shared by every element of one
/// design: the world position of the canonical first track element and its
/// orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignFrame {
    /// Preview origin, world units (z in world units too).
    pub origin: CoordsXYZ,
    pub save_direction: Direction,
}

impl DesignFrame {
    pub fn new(origin: CoordsXYZ, save_direction: Direction) -> Self {
        Self { origin, save_direction }
    }

    /// Translate and rotate a world position into the design frame, still in
    /// world units.
    pub fn to_relative(&self, world: CoordsXY) -> CoordsXY {
        CoordsXY::new(world.x - self.origin.x, world.y - self.origin.y)
            .rotated(self.save_direction.inverse())
    }

    /// World position to stored tile offsets.
    pub fn tile_offsets(&self, world: CoordsXY) -> Result<(i8, i8), SaveError> {
        let relative = self.to_relative(world);
        Ok((
            to_stored(relative.x / COORDS_XY_STEP)?,
            to_stored(relative.y / COORDS_XY_STEP)?,
        ))
    }

    /// World position to stored world-unit offsets (entrance records keep
    /// full resolution).
    pub fn world_offsets(&self, world: CoordsXY) -> Result<(i16, i16), SaveError> {
        let relative = self.to_relative(world);
        let check = |value: i32| -> Result<i16, SaveError> {
            i16::try_from(value).map_err(|_| SaveError::CoordinateOutOfRange { value })
        };
        Ok((check(relative.x)?, check(relative.y)?))
    }

    /// World height (world units) to stored height steps above the origin.
    pub fn z_offset(&self, world_z: i32) -> Result<i8, SaveError> {
        to_stored((world_z - self.origin.z) / COORDS_Z_STEP)
    }

    /// Rotate a directional field into the design frame.
    pub fn rotate_direction(&self, direction: Direction) -> Direction {
        direction.wrapping_sub(self.save_direction)
    }
}

fn to_stored(value: i32) -> Result<i8, SaveError> {
    if !(STORED_MIN..=STORED_MAX).contains(&value) {
        return Err(SaveError::CoordinateOutOfRange { value });
    }
    Ok(value as i8)
}
