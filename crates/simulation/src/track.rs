//! Walking a ride's track chain through the map.
//!
//! Track pieces link to the next piece of the chain via `chain_next`; the
//! canonical first piece carries `chain_start`. A closed circuit links its
//! last piece back to the start, and the walk terminates on revisiting it.

use crate::coords::TileCoordsXY;
use crate::map::TileMap;
use crate::ride::RideId;
use crate::tile_element::{ElementId, TileElement};

/// The canonical first track element of a ride, found by row-major scan.
pub fn track_origin(map: &TileMap, ride: RideId) -> Option<(TileCoordsXY, &TileElement)> {
    for coord in map.iter_coords() {
        for element in map.elements_at(coord) {
            if let Some(track) = element.as_track() {
                if track.ride == ride && track.chain_start {
                    return Some((coord, element));
                }
            }
        }
    }
    None
}

/// Follow an element's chain link to the next track piece.
pub fn track_next(map: &TileMap, element: &TileElement) -> Option<ElementId> {
    let track = element.as_track()?;
    let link = track.chain_next?;
    map.find_at(link.xy(), |e| {
        i32::from(e.base_height) == link.z && e.is_track_for(track.ride)
    })
    .map(|e| e.id)
}

/// Iterator over a ride's track chain, starting from the canonical origin.
pub struct TrackWalk<'a> {
    map: &'a TileMap,
    origin: ElementId,
    next: Option<ElementId>,
    started: bool,
}

impl<'a> Iterator for TrackWalk<'a> {
    type Item = (TileCoordsXY, &'a TileElement);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        if self.started && id == self.origin {
            return None;
        }
        self.started = true;
        let (coord, element) = self.map.element(id)?;
        self.next = track_next(self.map, element);
        Some((coord, element))
    }
}

/// Walk a ride's track from its origin. `None` if the ride has no origin
/// element on the map.
pub fn walk_track(map: &TileMap, ride: RideId) -> Option<TrackWalk<'_>> {
    let (_, origin) = track_origin(map, ride)?;
    Some(TrackWalk {
        map,
        origin: origin.id,
        next: Some(origin.id),
        started: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Direction, TileCoordsXYZ};
    use crate::tile_element::{TileElementData, TrackData};

    fn track_piece(
        ride: RideId,
        chain_start: bool,
        chain_next: Option<TileCoordsXYZ>,
    ) -> TileElementData {
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
            chain_start,
            chain_next,
        })
    }

    #[test]
    fn test_walk_open_chain() {
        let mut map = TileMap::new(8);
        let ride = RideId(0);
        map.insert(
            TileCoordsXY::new(1, 1),
            10,
            track_piece(ride, true, Some(TileCoordsXYZ::new(2, 1, 10))),
        )
        .unwrap();
        map.insert(TileCoordsXY::new(2, 1), 10, track_piece(ride, false, None))
            .unwrap();

        let visited: Vec<_> = walk_track(&map, ride).unwrap().map(|(c, _)| c).collect();
        assert_eq!(
            visited,
            vec![TileCoordsXY::new(1, 1), TileCoordsXY::new(2, 1)]
        );
    }

    #[test]
    fn test_walk_circuit_terminates_at_origin() {
        let mut map = TileMap::new(8);
        let ride = RideId(0);
        map.insert(
            TileCoordsXY::new(1, 1),
            10,
            track_piece(ride, true, Some(TileCoordsXYZ::new(2, 1, 10))),
        )
        .unwrap();
        map.insert(
            TileCoordsXY::new(2, 1),
            10,
            track_piece(ride, false, Some(TileCoordsXYZ::new(1, 1, 10))),
        )
        .unwrap();

        let visited: Vec<_> = walk_track(&map, ride).unwrap().map(|(c, _)| c).collect();
        assert_eq!(visited.len(), 2);
    }

    #[test]
    fn test_missing_origin() {
        let map = TileMap::new(8);
        assert!(track_origin(&map, RideId(9)).is_none());
        assert!(walk_track(&map, RideId(9)).is_none());
    }
}
