//! Scenery and ride object descriptors.
//!
//! Placed elements reference objects by a small per-category index; the
//! registry resolves those indices to the 16-byte legacy object entries the
//! file format stores, and, for large scenery, to the object's tile table.

use bevy::prelude::*;

use crate::coords::CoordsXY;

/// Object categories, identified by the low nibble of an entry's flags in
/// the legacy layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectCategory {
    Ride,
    SmallScenery,
    LargeScenery,
    Wall,
    Path,
}

impl ObjectCategory {
    pub fn object_type(self) -> u8 {
        match self {
            ObjectCategory::Ride => 0,
            ObjectCategory::SmallScenery => 1,
            ObjectCategory::LargeScenery => 2,
            ObjectCategory::Wall => 3,
            ObjectCategory::Path => 5,
        }
    }

    pub fn from_object_type(value: u8) -> Option<Self> {
        match value {
            0 => Some(ObjectCategory::Ride),
            1 => Some(ObjectCategory::SmallScenery),
            2 => Some(ObjectCategory::LargeScenery),
            3 => Some(ObjectCategory::Wall),
            5 => Some(ObjectCategory::Path),
            _ => None,
        }
    }
}

/// A legacy 16-byte object entry: flags, 8-character name, checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectEntry {
    pub flags: u32,
    pub name: [u8; 8],
    pub checksum: u32,
}

impl ObjectEntry {
    pub const ENCODED_SIZE: usize = 16;

    /// An entry with the given category and a space-padded name.
    pub fn new(category: ObjectCategory, name: &str) -> Self {
        let mut padded = [b' '; 8];
        for (slot, byte) in padded.iter_mut().zip(name.bytes()) {
            *slot = byte;
        }
        Self {
            flags: u32::from(category.object_type()),
            name: padded,
            checksum: 0,
        }
    }

    pub fn object_type(&self) -> u8 {
        (self.flags & 0x0F) as u8
    }

    pub fn category(&self) -> Option<ObjectCategory> {
        ObjectCategory::from_object_type(self.object_type())
    }

    pub fn to_bytes(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut out = [0u8; Self::ENCODED_SIZE];
        out[0..4].copy_from_slice(&self.flags.to_le_bytes());
        out[4..12].copy_from_slice(&self.name);
        out[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: [u8; Self::ENCODED_SIZE]) -> Self {
        let mut name = [0u8; 8];
        name.copy_from_slice(&bytes[4..12]);
        Self {
            flags: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            name,
            checksum: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        }
    }
}

impl Default for ObjectEntry {
    fn default() -> Self {
        Self {
            flags: 0,
            name: [b' '; 8],
            checksum: 0,
        }
    }
}

/// One tile of a large scenery object's footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LargeSceneryTile {
    /// Offset from the object origin, in world units, before rotation.
    pub offset: CoordsXY,
    /// Height offset from the object origin, in height steps.
    pub z_offset: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LargeSceneryEntry {
    pub object: ObjectEntry,
    pub tiles: Vec<LargeSceneryTile>,
}

/// Loaded scenery/path objects, indexed per category the way placed elements
/// reference them.
#[derive(Resource, Debug, Default)]
pub struct SceneryObjectRegistry {
    small: Vec<ObjectEntry>,
    large: Vec<LargeSceneryEntry>,
    walls: Vec<ObjectEntry>,
    paths: Vec<ObjectEntry>,
}

impl SceneryObjectRegistry {
    pub fn register_small(&mut self, entry: ObjectEntry) -> u8 {
        self.small.push(entry);
        (self.small.len() - 1) as u8
    }

    pub fn register_large(&mut self, object: ObjectEntry, tiles: Vec<LargeSceneryTile>) -> u8 {
        self.large.push(LargeSceneryEntry { object, tiles });
        (self.large.len() - 1) as u8
    }

    pub fn register_wall(&mut self, entry: ObjectEntry) -> u8 {
        self.walls.push(entry);
        (self.walls.len() - 1) as u8
    }

    pub fn register_path(&mut self, entry: ObjectEntry) -> u8 {
        self.paths.push(entry);
        (self.paths.len() - 1) as u8
    }

    pub fn small(&self, index: u8) -> Option<&ObjectEntry> {
        self.small.get(usize::from(index))
    }

    pub fn large(&self, index: u8) -> Option<&LargeSceneryEntry> {
        self.large.get(usize::from(index))
    }

    pub fn wall(&self, index: u8) -> Option<&ObjectEntry> {
        self.walls.get(usize::from(index))
    }

    pub fn path(&self, index: u8) -> Option<&ObjectEntry> {
        self.paths.get(usize::from(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_entry_round_trips_through_bytes() {
        let entry = ObjectEntry::new(ObjectCategory::Wall, "WALLBRK1");
        let decoded = ObjectEntry::from_bytes(entry.to_bytes());
        assert_eq!(decoded, entry);
        assert_eq!(decoded.category(), Some(ObjectCategory::Wall));
    }

    #[test]
    fn test_short_names_are_space_padded() {
        let entry = ObjectEntry::new(ObjectCategory::SmallScenery, "TREE");
        assert_eq!(&entry.name, b"TREE    ");
    }

    #[test]
    fn test_registry_indices_resolve() {
        let mut registry = SceneryObjectRegistry::default();
        let tree = registry.register_small(ObjectEntry::new(ObjectCategory::SmallScenery, "TREE"));
        let fence = registry.register_wall(ObjectEntry::new(ObjectCategory::Wall, "FENCE"));
        assert_eq!(registry.small(tree).map(|e| e.name), Some(*b"TREE    "));
        assert_eq!(registry.wall(fence).map(|e| e.name), Some(*b"FENCE   "));
        assert!(registry.large(0).is_none());
    }
}
