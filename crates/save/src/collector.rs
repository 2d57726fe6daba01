//! Interactive scenery selection for a design save.
//!
//! While the save workflow is in its selecting state, a [`SaveSession`]
//! resource holds the ride being saved and the set of scenery elements the
//! user has picked to bundle with the design. Selection is by [`ElementId`],
//! so the session never borrows the map.

use bevy::prelude::*;

use simulation::coords::TileCoordsXY;
use simulation::map::TileMap;
use simulation::ride::RideId;
use simulation::scenery_objects::SceneryObjectRegistry;
use simulation::tile_element::{ElementId, TileElement, TileElementData};

use crate::save_error::SaveError;

/// Hard cap on selected map elements per design.
pub const MAX_SAVED_ELEMENTS: usize = 1500;

/// Chebyshev radius, in tiles, of the nearby-scenery scan.
pub const NEARBY_SCENERY_DISTANCE: i32 = 1;

/// The selection being assembled for one ride's design save.
///
/// Exactly one session exists at a time; it is created on entering save mode
/// and removed on cancel or completed save.
#[derive(Resource, Debug)]
pub struct SaveSession {
    ride: RideId,
    selected: Vec<ElementId>,
}

impl SaveSession {
    pub fn new(ride: RideId) -> Self {
        Self { ride, selected: Vec::new() }
    }

    pub fn ride(&self) -> RideId {
        self.ride
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn selected(&self) -> &[ElementId] {
        &self.selected
    }

    pub fn reset(&mut self) {
        self.selected.clear();
    }

    /// Add or remove one scenery element.
    ///
    /// Large scenery is toggled as a whole object: every segment the map
    /// still holds is added or removed together, and the object costs one
    /// selection slot per segment. A rejected add leaves the selection
    /// untouched. Non-scenery elements are ignored.
    pub fn toggle_element(
        &mut self,
        map: &TileMap,
        registry: &SceneryObjectRegistry,
        id: ElementId,
        select: bool,
    ) -> Result<(), SaveError> {
        let Some((coord, element)) = map.element(id) else {
            return Ok(());
        };
        let ids = match &element.data {
            TileElementData::SmallScenery(_)
            | TileElementData::Wall(_)
            | TileElementData::Path(_) => vec![id],
            TileElementData::LargeScenery(_) => {
                large_scenery_segments(map, registry, coord, element)?
            }
            _ => return Ok(()),
        };
        if select {
            let cost = ids.iter().filter(|i| !self.contains(**i)).count();
            if self.selected.len() + cost > MAX_SAVED_ELEMENTS {
                return Err(SaveError::CapacityExceeded);
            }
            for segment in ids {
                if !self.contains(segment) {
                    self.selected.push(segment);
                }
            }
        } else {
            self.selected.retain(|segment| !ids.contains(segment));
        }
        Ok(())
    }

    /// Select all scenery within [`NEARBY_SCENERY_DISTANCE`] tiles of every
    /// tile holding this ride's track, entrances or queue paths.
    pub fn select_nearby_scenery(
        &mut self,
        map: &TileMap,
        registry: &SceneryObjectRegistry,
    ) -> Result<(), SaveError> {
        for coord in map.iter_coords() {
            if !self.tile_belongs_to_ride(map, coord) {
                continue;
            }
            for dy in -NEARBY_SCENERY_DISTANCE..=NEARBY_SCENERY_DISTANCE {
                for dx in -NEARBY_SCENERY_DISTANCE..=NEARBY_SCENERY_DISTANCE {
                    let neighbour = TileCoordsXY::new(coord.x + dx, coord.y + dy);
                    for element in map.elements_at(neighbour) {
                        if is_scenery(element) && !self.contains(element.id) {
                            self.toggle_element(map, registry, element.id, true)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn tile_belongs_to_ride(&self, map: &TileMap, coord: TileCoordsXY) -> bool {
        map.elements_at(coord).iter().any(|element| match &element.data {
            TileElementData::Track(track) => track.ride == self.ride,
            TileElementData::Entrance(entrance) => entrance.ride == self.ride,
            TileElementData::Path(path) => path.queue_ride == Some(self.ride),
            _ => false,
        })
    }
}

fn is_scenery(element: &TileElement) -> bool {
    matches!(
        element.data,
        TileElementData::SmallScenery(_)
            | TileElementData::Wall(_)
            | TileElementData::LargeScenery(_)
            | TileElementData::Path(_)
    )
}

/// Resolve every segment of the large scenery object one segment belongs to,
/// by walking the object's tile table from the segment back to its origin.
fn large_scenery_segments(
    map: &TileMap,
    registry: &SceneryObjectRegistry,
    coord: TileCoordsXY,
    element: &TileElement,
) -> Result<Vec<ElementId>, SaveError> {
    let TileElementData::LargeScenery(data) = &element.data else {
        return Ok(Vec::new());
    };
    let entry = registry
        .large(data.object)
        .ok_or(SaveError::UnknownObject(data.object))?;
    let Some(my_tile) = entry.tiles.get(usize::from(data.sequence)) else {
        return Ok(vec![element.id]);
    };

    let my_offset = my_tile.offset.rotated(data.direction);
    let origin_world = simulation::coords::CoordsXY::new(
        coord.world().x - my_offset.x,
        coord.world().y - my_offset.y,
    );
    let origin_height = i32::from(element.base_height) - my_tile.z_offset;

    let mut ids = Vec::with_capacity(entry.tiles.len());
    for (sequence, tile) in entry.tiles.iter().enumerate() {
        let offset = tile.offset.rotated(data.direction);
        let segment_coord = simulation::coords::CoordsXY::new(
            origin_world.x + offset.x,
            origin_world.y + offset.y,
        )
        .to_tile();
        let expected_height = origin_height + tile.z_offset;
        let found = map.find_at(segment_coord, |e| {
            matches!(
                &e.data,
                TileElementData::LargeScenery(other)
                    if other.object == data.object
                        && other.direction == data.direction
                        && usize::from(other.sequence) == sequence
            ) && i32::from(e.base_height) == expected_height
        });
        if let Some(segment) = found {
            ids.push(segment.id);
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::coords::{CoordsXY, Direction};
    use simulation::scenery_objects::{LargeSceneryTile, ObjectCategory, ObjectEntry};
    use simulation::tile_element::{LargeSceneryData, SmallSceneryData, TrackData};

    fn small_scenery(object: u8) -> TileElementData {
        TileElementData::SmallScenery(SmallSceneryData {
            object,
            direction: Direction::North,
            quadrant: 0,
            primary_colour: 0,
            secondary_colour: 0,
        })
    }

    fn track_piece(ride: RideId) -> TileElementData {
        TileElementData::Track(TrackData {
            ride,
            track_type: 0,
            direction: Direction::North,
            sequence: 0,
            colour_scheme: 0,
            seat_rotation: 4,
            brake_speed: 0,
            has_chain: false,
            inverted: false,
            maze_entry: 0,
            chain_start: true,
            chain_next: None,
        })
    }

    fn registry_with_small() -> SceneryObjectRegistry {
        let mut registry = SceneryObjectRegistry::default();
        registry.register_small(ObjectEntry::new(ObjectCategory::SmallScenery, "TREE"));
        registry
    }

    #[test]
    fn test_toggle_is_idempotent() {
        let mut map = TileMap::new(8);
        let registry = registry_with_small();
        let id = map.insert(TileCoordsXY::new(1, 1), 4, small_scenery(0)).unwrap();

        let mut session = SaveSession::new(RideId(0));
        session.toggle_element(&map, &registry, id, true).unwrap();
        session.toggle_element(&map, &registry, id, true).unwrap();
        assert_eq!(session.len(), 1);

        session.toggle_element(&map, &registry, id, false).unwrap();
        assert!(session.is_empty());
    }

    #[test]
    fn test_capacity_boundary_leaves_selection_unchanged() {
        let mut map = TileMap::new(64);
        let registry = registry_with_small();
        let mut ids = Vec::new();
        for i in 0..=MAX_SAVED_ELEMENTS {
            let coord = TileCoordsXY::new((i % 64) as i32, (i / 64) as i32);
            ids.push(map.insert(coord, 4, small_scenery(0)).unwrap());
        }

        let mut session = SaveSession::new(RideId(0));
        for id in &ids[..MAX_SAVED_ELEMENTS] {
            session.toggle_element(&map, &registry, *id, true).unwrap();
        }
        assert_eq!(session.len(), MAX_SAVED_ELEMENTS);

        let rejected =
            session.toggle_element(&map, &registry, ids[MAX_SAVED_ELEMENTS], true);
        assert!(matches!(rejected, Err(SaveError::CapacityExceeded)));
        assert_eq!(session.len(), MAX_SAVED_ELEMENTS);
        assert!(!session.contains(ids[MAX_SAVED_ELEMENTS]));
    }

    #[test]
    fn test_large_scenery_toggles_every_segment() {
        let mut map = TileMap::new(8);
        let mut registry = SceneryObjectRegistry::default();
        let object = registry.register_large(
            ObjectEntry::new(ObjectCategory::LargeScenery, "FOUNTAIN"),
            vec![
                LargeSceneryTile { offset: CoordsXY::new(0, 0), z_offset: 0 },
                LargeSceneryTile { offset: CoordsXY::new(32, 0), z_offset: 0 },
            ],
        );
        let segment = |sequence| {
            TileElementData::LargeScenery(LargeSceneryData {
                object,
                direction: Direction::North,
                sequence,
                primary_colour: 0,
                secondary_colour: 0,
            })
        };
        let a = map.insert(TileCoordsXY::new(2, 2), 6, segment(0)).unwrap();
        let b = map.insert(TileCoordsXY::new(3, 2), 6, segment(1)).unwrap();

        let mut session = SaveSession::new(RideId(0));
        // Toggling the second segment selects the whole object.
        session.toggle_element(&map, &registry, b, true).unwrap();
        assert!(session.contains(a));
        assert!(session.contains(b));
        assert_eq!(session.len(), 2);

        session.toggle_element(&map, &registry, a, false).unwrap();
        assert!(session.is_empty());
    }

    #[test]
    fn test_nearby_scenery_respects_chebyshev_distance() {
        let mut map = TileMap::new(16);
        let registry = registry_with_small();
        let ride = RideId(2);
        map.insert(TileCoordsXY::new(5, 5), 4, track_piece(ride)).unwrap();

        let adjacent = map.insert(TileCoordsXY::new(6, 6), 4, small_scenery(0)).unwrap();
        let diagonal = map.insert(TileCoordsXY::new(4, 4), 4, small_scenery(0)).unwrap();
        let too_far = map.insert(TileCoordsXY::new(7, 5), 4, small_scenery(0)).unwrap();

        let mut session = SaveSession::new(ride);
        session.select_nearby_scenery(&map, &registry).unwrap();

        assert!(session.contains(adjacent));
        assert!(session.contains(diagonal));
        assert!(!session.contains(too_far));
    }

    #[test]
    fn test_other_rides_track_does_not_attract_scenery() {
        let mut map = TileMap::new(16);
        let registry = registry_with_small();
        map.insert(TileCoordsXY::new(5, 5), 4, track_piece(RideId(7))).unwrap();
        map.insert(TileCoordsXY::new(5, 6), 4, small_scenery(0)).unwrap();

        let mut session = SaveSession::new(RideId(1));
        session.select_nearby_scenery(&map, &registry).unwrap();
        assert!(session.is_empty());
    }
}
