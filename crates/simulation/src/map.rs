//! The tile map: a fixed-size grid of tiles, each holding an ordered list of
//! elements.
//!
//! Elements are handed out a process-unique [`ElementId`] on insertion so
//! other subsystems can hold on to an identity without borrowing the map.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::config::MAP_SIZE;
use crate::coords::TileCoordsXY;
use crate::tile_element::{ElementId, TileElement, TileElementData};

#[derive(Resource, Debug)]
pub struct TileMap {
    size: i32,
    tiles: Vec<Vec<TileElement>>,
    positions: HashMap<ElementId, TileCoordsXY>,
    next_id: u32,
}

impl Default for TileMap {
    fn default() -> Self {
        Self::new(MAP_SIZE)
    }
}

impl TileMap {
    pub fn new(size: i32) -> Self {
        Self {
            size,
            tiles: vec![Vec::new(); (size * size) as usize],
            positions: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    fn index(&self, coord: TileCoordsXY) -> Option<usize> {
        if coord.x < 0 || coord.y < 0 || coord.x >= self.size || coord.y >= self.size {
            None
        } else {
            Some((coord.y * self.size + coord.x) as usize)
        }
    }

    /// Place an element on a tile. Returns `None` if the tile is out of
    /// bounds.
    pub fn insert(
        &mut self,
        coord: TileCoordsXY,
        base_height: u8,
        data: TileElementData,
    ) -> Option<ElementId> {
        let index = self.index(coord)?;
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.tiles[index].push(TileElement {
            id,
            base_height,
            data,
        });
        self.positions.insert(id, coord);
        Some(id)
    }

    /// All elements on a tile, bottom-up. Out-of-bounds tiles are empty.
    pub fn elements_at(&self, coord: TileCoordsXY) -> &[TileElement] {
        match self.index(coord) {
            Some(index) => &self.tiles[index],
            None => &[],
        }
    }

    /// Resolve an element id back to its tile and data.
    pub fn element(&self, id: ElementId) -> Option<(TileCoordsXY, &TileElement)> {
        let coord = *self.positions.get(&id)?;
        let element = self.elements_at(coord).iter().find(|e| e.id == id)?;
        Some((coord, element))
    }

    /// First element on the tile matching the predicate.
    pub fn find_at(
        &self,
        coord: TileCoordsXY,
        predicate: impl Fn(&TileElement) -> bool,
    ) -> Option<&TileElement> {
        self.elements_at(coord).iter().find(|e| predicate(e))
    }

    /// All tile coordinates in row-major order.
    pub fn iter_coords(&self) -> impl Iterator<Item = TileCoordsXY> + '_ {
        let size = self.size;
        (0..size).flat_map(move |y| (0..size).map(move |x| TileCoordsXY::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut map = TileMap::new(8);
        let coord = TileCoordsXY::new(2, 3);
        let id = map.insert(coord, 14, TileElementData::Surface).unwrap();

        assert_eq!(map.elements_at(coord).len(), 1);
        let (found_coord, element) = map.element(id).unwrap();
        assert_eq!(found_coord, coord);
        assert_eq!(element.base_height, 14);
    }

    #[test]
    fn test_out_of_bounds_is_empty() {
        let mut map = TileMap::new(8);
        assert!(map
            .insert(TileCoordsXY::new(8, 0), 0, TileElementData::Surface)
            .is_none());
        assert!(map.elements_at(TileCoordsXY::new(-1, 2)).is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut map = TileMap::new(4);
        let a = map
            .insert(TileCoordsXY::new(0, 0), 0, TileElementData::Surface)
            .unwrap();
        let b = map
            .insert(TileCoordsXY::new(0, 0), 2, TileElementData::Surface)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_iter_coords_is_row_major() {
        let map = TileMap::new(2);
        let coords: Vec<_> = map.iter_coords().collect();
        assert_eq!(
            coords,
            vec![
                TileCoordsXY::new(0, 0),
                TileCoordsXY::new(1, 0),
                TileCoordsXY::new(0, 1),
                TileCoordsXY::new(1, 1),
            ]
        );
    }
}
