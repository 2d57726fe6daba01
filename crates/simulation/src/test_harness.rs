//! Headless Bevy app harness for exercising the park model in tests.
//!
//! Wraps `App` + `SimulationPlugin` (plus the schedule/state plugins they
//! need) so tests in this workspace can build small parks and tick the
//! update schedule without a window or renderer.

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use crate::coords::TileCoordsXY;
use crate::map::TileMap;
use crate::ride::{Ride, RideList};
use crate::tile_element::{ElementId, TileElementData};
use crate::SimulationPlugin;

pub struct TestPark {
    app: App,
}

impl TestPark {
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.add_plugins(SimulationPlugin);
        Self { app }
    }

    /// Advance the update schedule by one frame.
    pub fn tick(&mut self) {
        self.app.update();
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn add_ride(&mut self, ride: Ride) {
        self.world_mut().resource_mut::<RideList>().insert(ride);
    }

    /// Place an element; panics on out-of-bounds, which is a test bug.
    pub fn insert_element(
        &mut self,
        coord: TileCoordsXY,
        base_height: u8,
        data: TileElementData,
    ) -> ElementId {
        self.world_mut()
            .resource_mut::<TileMap>()
            .insert(coord, base_height, data)
            .expect("tile coordinate out of bounds")
    }
}

impl Default for TestPark {
    fn default() -> Self {
        Self::new()
    }
}
