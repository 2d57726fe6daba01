use bevy::prelude::*;

pub mod config;
pub mod coords;
pub mod map;
pub mod notifications;
pub mod ride;
pub mod scenery_objects;
pub mod test_harness;
pub mod tile_element;
pub mod track;

/// Mode of the track-design save workflow.
///
/// `Selecting` is active while the user is interactively picking scenery to
/// bundle with a design; entering it creates the save session, leaving it
/// (cancel or completed save) tears the session down.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DesignSaveState {
    #[default]
    Inactive,
    Selecting,
}

/// Core park model: tile map, rides, scenery objects and notifications.
///
/// Requires `StatesPlugin` (part of `DefaultPlugins`; added explicitly in
/// headless tests).
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<DesignSaveState>()
            .init_resource::<map::TileMap>()
            .init_resource::<ride::RideList>()
            .init_resource::<scenery_objects::SceneryObjectRegistry>()
            .add_plugins(notifications::NotificationPlugin);
    }
}
