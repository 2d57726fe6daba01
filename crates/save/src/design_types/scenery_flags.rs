//! Per-category flag-byte layouts for stored scenery records.
//!
//! The stored flags byte means something different for every scenery
//! category. Each variant owns its bit layout, so packing and the
//! save-direction rotation live in one place instead of at every call site.

use simulation::coords::Direction;

/// Typed view of a scenery record's flags byte.
///
/// Layouts:
/// - `Path`: bits 0..=3 edge-connection mask, bit 4 sloped, bits 5..=6 slope
///   direction, bit 7 queue.
/// - `Wall`: bits 0..=1 direction, bits 2..=7 tertiary colour.
/// - `Quadrant` (small and large scenery): bits 0..=1 direction,
///   bits 2..=3 quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneryFlags {
    Path {
        edges: u8,
        sloped: bool,
        slope_direction: Direction,
        is_queue: bool,
    },
    Wall {
        direction: Direction,
        tertiary_colour: u8,
    },
    Quadrant {
        direction: Direction,
        quadrant: u8,
    },
}

impl SceneryFlags {
    pub fn pack(self) -> u8 {
        match self {
            SceneryFlags::Path { edges, sloped, slope_direction, is_queue } => {
                let mut byte = edges & 0x0F;
                if sloped {
                    byte |= 1 << 4;
                    byte |= slope_direction.as_u8() << 5;
                }
                if is_queue {
                    byte |= 1 << 7;
                }
                byte
            }
            SceneryFlags::Wall { direction, tertiary_colour } => {
                direction.as_u8() | ((tertiary_colour & 0x3F) << 2)
            }
            SceneryFlags::Quadrant { direction, quadrant } => {
                direction.as_u8() | ((quadrant & 0x03) << 2)
            }
        }
    }

    /// Interpret a stored flags byte for the given category layout.
    pub fn unpack_path(byte: u8) -> Self {
        SceneryFlags::Path {
            edges: byte & 0x0F,
            sloped: byte & (1 << 4) != 0,
            slope_direction: Direction::from_u8((byte >> 5) & 0x03),
            is_queue: byte & (1 << 7) != 0,
        }
    }

    pub fn unpack_wall(byte: u8) -> Self {
        SceneryFlags::Wall {
            direction: Direction::from_u8(byte & 0x03),
            tertiary_colour: (byte >> 2) & 0x3F,
        }
    }

    pub fn unpack_quadrant(byte: u8) -> Self {
        SceneryFlags::Quadrant {
            direction: Direction::from_u8(byte & 0x03),
            quadrant: (byte >> 2) & 0x03,
        }
    }

    /// Rotate the directional fields into the design frame by subtracting
    /// `save_direction` quarter turns.
    pub fn rotated(self, save_direction: Direction) -> Self {
        let steps = save_direction.as_u8() as u32;
        match self {
            SceneryFlags::Path { edges, sloped, slope_direction, is_queue } => {
                // 4-bit edge mask rotates with the frame.
                let edges = ((edges | (edges << 4)) >> steps) & 0x0F;
                SceneryFlags::Path {
                    edges,
                    sloped,
                    slope_direction: slope_direction.wrapping_sub(save_direction),
                    is_queue,
                }
            }
            SceneryFlags::Wall { direction, tertiary_colour } => SceneryFlags::Wall {
                direction: direction.wrapping_sub(save_direction),
                tertiary_colour,
            },
            SceneryFlags::Quadrant { direction, quadrant } => SceneryFlags::Quadrant {
                direction: direction.wrapping_sub(save_direction),
                quadrant: (quadrant.wrapping_sub(save_direction.as_u8())) & 0x03,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_pack_round_trip() {
        let flags = SceneryFlags::Path {
            edges: 0b1010,
            sloped: true,
            slope_direction: Direction::South,
            is_queue: true,
        };
        assert_eq!(SceneryFlags::unpack_path(flags.pack()), flags);
    }

    #[test]
    fn test_path_pack_bits() {
        let byte = SceneryFlags::Path {
            edges: 0b0011,
            sloped: true,
            slope_direction: Direction::East,
            is_queue: false,
        }
        .pack();
        assert_eq!(byte, 0b0011 | (1 << 4) | (1 << 5));
    }

    #[test]
    fn test_unsloped_path_stores_no_slope_direction() {
        let byte = SceneryFlags::Path {
            edges: 0x0F,
            sloped: false,
            slope_direction: Direction::West,
            is_queue: false,
        }
        .pack();
        assert_eq!(byte, 0x0F);
    }

    #[test]
    fn test_wall_pack_round_trip() {
        let flags = SceneryFlags::Wall { direction: Direction::West, tertiary_colour: 29 };
        assert_eq!(SceneryFlags::unpack_wall(flags.pack()), flags);
    }

    #[test]
    fn test_quadrant_pack_round_trip() {
        let flags = SceneryFlags::Quadrant { direction: Direction::East, quadrant: 2 };
        assert_eq!(SceneryFlags::unpack_quadrant(flags.pack()), flags);
    }

    #[test]
    fn test_edge_mask_rotation() {
        // A single north edge (bit 0) seen from a frame saved facing east
        // becomes a west edge (bit 3).
        let flags = SceneryFlags::Path {
            edges: 0b0001,
            sloped: false,
            slope_direction: Direction::North,
            is_queue: false,
        };
        let rotated = flags.rotated(Direction::East);
        match rotated {
            SceneryFlags::Path { edges, .. } => assert_eq!(edges, 0b1000),
            _ => panic!("variant changed"),
        }
    }

    #[test]
    fn test_direction_rotation_cancels() {
        let flags = SceneryFlags::Quadrant { direction: Direction::South, quadrant: 2 };
        match flags.rotated(Direction::South) {
            SceneryFlags::Quadrant { direction, quadrant } => {
                assert_eq!(direction, Direction::North);
                assert_eq!(quadrant, 0);
            }
            _ => panic!("variant changed"),
        }
    }

    #[test]
    fn test_full_rotation_is_identity() {
        let flags = SceneryFlags::Path {
            edges: 0b0110,
            sloped: true,
            slope_direction: Direction::East,
            is_queue: true,
        };
        let mut rotated = flags;
        for _ in 0..4 {
            rotated = rotated.rotated(Direction::East);
        }
        assert_eq!(rotated, flags);
    }
}
