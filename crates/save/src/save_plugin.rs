//! Event-driven save workflow.
//!
//! The whole workflow is synchronous and single-threaded; the only
//! suspension point is the path picker, modelled as an explicit
//! request/response event pair instead of a callback. One design can be
//! pending a path at a time, held in the [`PendingDesign`] resource.
//!
//! Flow: `EnterDesignSaveModeEvent` creates the [`SaveSession`] and moves
//! [`DesignSaveState`] to `Selecting`; toggle/select events edit the
//! session; `SaveTrackDesignEvent` builds the design and emits
//! [`SavePathRequest`] toward the UI layer; [`SavePathResponse`] with a path
//! encodes and writes the file, fires [`RepositoryChangedEvent`] and leaves
//! save mode. Every failure surfaces as a warning notification.

use std::path::PathBuf;

use bevy::prelude::*;

use simulation::map::TileMap;
use simulation::notifications::{NotificationEvent, NotificationPriority};
use simulation::ride::{RideId, RideList};
use simulation::scenery_objects::SceneryObjectRegistry;
use simulation::tile_element::ElementId;
use simulation::DesignSaveState;

use crate::collector::SaveSession;
use crate::design_types::TrackDesign;
use crate::repository::DesignRepository;
use crate::serializer::{build_design, write_design};

/// Start interactive scenery selection for a ride.
#[derive(Event, Debug, Clone, Copy)]
pub struct EnterDesignSaveModeEvent {
    pub ride: RideId,
}

/// Cancel the save workflow and drop all selection state.
#[derive(Event, Debug, Clone, Copy)]
pub struct ExitDesignSaveModeEvent;

/// Add or remove one scenery element from the selection.
#[derive(Event, Debug, Clone, Copy)]
pub struct ToggleSceneryEvent {
    pub element: ElementId,
    pub select: bool,
}

/// Select all scenery near the ride's own tiles.
#[derive(Event, Debug, Clone, Copy)]
pub struct SelectNearbySceneryEvent;

/// Build the design for the current session and ask for a destination.
#[derive(Event, Debug, Clone, Copy)]
pub struct SaveTrackDesignEvent {
    pub with_scenery: bool,
}

/// Emitted toward the UI layer to pick a destination path.
#[derive(Event, Debug, Clone)]
pub struct SavePathRequest {
    pub ride: RideId,
    pub suggested_name: String,
}

/// The UI layer's answer to [`SavePathRequest`]; `None` cancels.
#[derive(Event, Debug, Clone)]
pub struct SavePathResponse {
    pub path: Option<PathBuf>,
}

/// Fired after a design file lands on disk.
#[derive(Event, Debug, Clone, Copy)]
pub struct RepositoryChangedEvent;

/// The built design waiting for a destination path.
#[derive(Resource, Debug)]
pub struct PendingDesign {
    pub ride: RideId,
    pub design: TrackDesign,
}

/// Wires the track-design save workflow into the app.
pub struct SavePlugin {
    repository_root: PathBuf,
}

impl SavePlugin {
    pub fn new(repository_root: impl Into<PathBuf>) -> Self {
        Self { repository_root: repository_root.into() }
    }
}

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DesignRepository::new(self.repository_root.clone()))
            .add_event::<EnterDesignSaveModeEvent>()
            .add_event::<ExitDesignSaveModeEvent>()
            .add_event::<ToggleSceneryEvent>()
            .add_event::<SelectNearbySceneryEvent>()
            .add_event::<SaveTrackDesignEvent>()
            .add_event::<SavePathRequest>()
            .add_event::<SavePathResponse>()
            .add_event::<RepositoryChangedEvent>()
            .add_systems(
                Update,
                (
                    handle_mode_transitions,
                    handle_toggle_scenery,
                    handle_select_nearby,
                    handle_save_request,
                    handle_path_response,
                    rescan_repository,
                )
                    .chain(),
            );
    }
}

fn handle_mode_transitions(
    mut commands: Commands,
    mut enter_events: EventReader<EnterDesignSaveModeEvent>,
    mut exit_events: EventReader<ExitDesignSaveModeEvent>,
    mut next_state: ResMut<NextState<DesignSaveState>>,
) {
    for event in enter_events.read() {
        info!("entering design save mode for ride {}", event.ride.0);
        commands.insert_resource(SaveSession::new(event.ride));
        next_state.set(DesignSaveState::Selecting);
    }
    if !exit_events.is_empty() {
        exit_events.clear();
        info!("leaving design save mode");
        commands.remove_resource::<SaveSession>();
        commands.remove_resource::<PendingDesign>();
        next_state.set(DesignSaveState::Inactive);
    }
}

fn handle_toggle_scenery(
    mut events: EventReader<ToggleSceneryEvent>,
    mut session: Option<ResMut<SaveSession>>,
    map: Res<TileMap>,
    registry: Res<SceneryObjectRegistry>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    let Some(session) = session.as_deref_mut() else {
        events.clear();
        return;
    };
    for event in events.read() {
        if let Err(e) = session.toggle_element(&map, &registry, event.element, event.select) {
            notifications.send(NotificationEvent {
                text: e.to_string(),
                priority: NotificationPriority::Warning,
            });
        }
    }
}

fn handle_select_nearby(
    mut events: EventReader<SelectNearbySceneryEvent>,
    mut session: Option<ResMut<SaveSession>>,
    map: Res<TileMap>,
    registry: Res<SceneryObjectRegistry>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    if events.is_empty() {
        return;
    }
    events.clear();
    let Some(session) = session.as_deref_mut() else {
        return;
    };
    if let Err(e) = session.select_nearby_scenery(&map, &registry) {
        notifications.send(NotificationEvent {
            text: e.to_string(),
            priority: NotificationPriority::Warning,
        });
    }
}

fn handle_save_request(
    mut commands: Commands,
    mut events: EventReader<SaveTrackDesignEvent>,
    session: Option<Res<SaveSession>>,
    pending: Option<Res<PendingDesign>>,
    map: Res<TileMap>,
    rides: Res<RideList>,
    registry: Res<SceneryObjectRegistry>,
    mut path_requests: EventWriter<SavePathRequest>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    let Some(event) = events.read().last() else {
        return;
    };
    let Some(session) = session.as_deref() else {
        return;
    };
    if pending.is_some() {
        // A design is already waiting for its path.
        return;
    }

    let ride = session.ride();
    let scenery_free_session;
    let build_session = if event.with_scenery {
        session
    } else {
        scenery_free_session = SaveSession::new(ride);
        &scenery_free_session
    };
    match build_design(&map, &rides, &registry, build_session) {
        Ok(design) => {
            let suggested_name = rides
                .get(ride)
                .map(|r| r.name.clone())
                .unwrap_or_default();
            commands.insert_resource(PendingDesign { ride, design });
            path_requests.send(SavePathRequest { ride, suggested_name });
        }
        Err(e) => {
            warn!("design build failed: {e}");
            notifications.send(NotificationEvent {
                text: e.to_string(),
                priority: NotificationPriority::Warning,
            });
        }
    }
}

fn handle_path_response(
    mut commands: Commands,
    mut events: EventReader<SavePathResponse>,
    pending: Option<Res<PendingDesign>>,
    mut next_state: ResMut<NextState<DesignSaveState>>,
    mut repository_changed: EventWriter<RepositoryChangedEvent>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    let Some(event) = events.read().last() else {
        return;
    };
    let Some(pending) = pending.as_deref() else {
        return;
    };
    let Some(path) = &event.path else {
        // Picker cancelled; the built design is discarded, selection stays.
        commands.remove_resource::<PendingDesign>();
        return;
    };

    match write_design(&pending.design, path) {
        Ok(()) => {
            info!("design for ride {} written to {}", pending.ride.0, path.display());
            notifications.send(NotificationEvent {
                text: String::from("Track design saved"),
                priority: NotificationPriority::Info,
            });
            repository_changed.send(RepositoryChangedEvent);
            commands.remove_resource::<PendingDesign>();
            commands.remove_resource::<SaveSession>();
            next_state.set(DesignSaveState::Inactive);
        }
        Err(e) => {
            warn!("design write failed: {e}");
            notifications.send(NotificationEvent {
                text: e.to_string(),
                priority: NotificationPriority::Warning,
            });
            commands.remove_resource::<PendingDesign>();
        }
    }
}

fn rescan_repository(
    mut events: EventReader<RepositoryChangedEvent>,
    mut repository: ResMut<DesignRepository>,
) {
    if events.is_empty() {
        return;
    }
    events.clear();
    if let Err(e) = repository.scan() {
        warn!("design repository rescan failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::coords::{Direction, TileCoordsXY, TileCoordsXYZ, TileCoordsXYZD};
    use simulation::ride::{Ride, RideRatings, RideType, Station};
    use simulation::test_harness::TestPark;
    use simulation::tile_element::{SmallSceneryData, TileElementData, TrackData};
    use simulation::scenery_objects::{ObjectCategory, ObjectEntry};
    use std::fs;

    fn test_root(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/track_design_plugin_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn park(root: &PathBuf) -> TestPark {
        let mut park = TestPark::new();
        park.app_mut().add_plugins(SavePlugin::new(root));

        let ride = RideId(1);
        let mut r = Ride::new(ride, RideType(4));
        r.tested = true;
        r.ratings = Some(RideRatings { excitement: 500, intensity: 400, nausea: 200 });
        r.stations[0] = Some(Station {
            height: 8,
            entrance: Some(TileCoordsXYZD::new(4, 5, 8, Direction::South)),
            exit: Some(TileCoordsXYZD::new(5, 5, 8, Direction::East)),
        });
        park.add_ride(r);

        let piece = |chain_start, chain_next| {
            TileElementData::Track(TrackData {
                ride,
                track_type: 12,
                direction: Direction::South,
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
        };
        park.insert_element(
            TileCoordsXY::new(4, 4),
            8,
            piece(true, Some(TileCoordsXYZ::new(5, 4, 8))),
        );
        park.insert_element(TileCoordsXY::new(5, 4), 8, piece(false, None));
        park
    }

    fn current_state(park: &mut TestPark) -> DesignSaveState {
        *park.world_mut().resource::<State<DesignSaveState>>().get()
    }

    #[test]
    fn test_enter_creates_session_and_selecting_state() {
        let root = test_root("enter");
        let mut park = park(&root);
        park.world_mut().send_event(EnterDesignSaveModeEvent { ride: RideId(1) });
        park.tick();
        park.tick();

        assert!(park.world_mut().get_resource::<SaveSession>().is_some());
        assert_eq!(current_state(&mut park), DesignSaveState::Selecting);
    }

    #[test]
    fn test_exit_discards_session() {
        let root = test_root("exit");
        let mut park = park(&root);
        park.world_mut().send_event(EnterDesignSaveModeEvent { ride: RideId(1) });
        park.tick();
        park.world_mut().send_event(ExitDesignSaveModeEvent);
        park.tick();
        park.tick();

        assert!(park.world_mut().get_resource::<SaveSession>().is_none());
        assert_eq!(current_state(&mut park), DesignSaveState::Inactive);
    }

    #[test]
    fn test_toggle_event_selects_scenery() {
        let root = test_root("toggle");
        let mut park = park(&root);
        let object = park
            .world_mut()
            .resource_mut::<SceneryObjectRegistry>()
            .register_small(ObjectEntry::new(ObjectCategory::SmallScenery, "TREE"));
        let id = park.insert_element(
            TileCoordsXY::new(3, 4),
            8,
            TileElementData::SmallScenery(SmallSceneryData {
                object,
                direction: Direction::North,
                quadrant: 0,
                primary_colour: 0,
                secondary_colour: 0,
            }),
        );

        park.world_mut().send_event(EnterDesignSaveModeEvent { ride: RideId(1) });
        park.tick();
        park.world_mut().send_event(ToggleSceneryEvent { element: id, select: true });
        park.tick();

        assert!(park.world_mut().resource::<SaveSession>().contains(id));
    }

    #[test]
    fn test_save_request_emits_path_request_and_pending_design() {
        let root = test_root("request");
        let mut park = park(&root);
        park.world_mut().send_event(EnterDesignSaveModeEvent { ride: RideId(1) });
        park.tick();
        park.world_mut().send_event(SaveTrackDesignEvent { with_scenery: true });
        park.tick();

        assert!(park.world_mut().get_resource::<PendingDesign>().is_some());
        let requests = park.world_mut().resource::<Events<SavePathRequest>>();
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn test_path_response_writes_file_and_leaves_save_mode() {
        let root = test_root("response");
        let mut park = park(&root);
        park.world_mut().send_event(EnterDesignSaveModeEvent { ride: RideId(1) });
        park.tick();
        park.world_mut().send_event(SaveTrackDesignEvent { with_scenery: true });
        park.tick();

        let path = root.join("coaster.td6");
        park.world_mut().send_event(SavePathResponse { path: Some(path.clone()) });
        park.tick();
        park.tick();

        assert!(path.exists());
        assert!(park.world_mut().get_resource::<PendingDesign>().is_none());
        assert!(park.world_mut().get_resource::<SaveSession>().is_none());
        assert_eq!(current_state(&mut park), DesignSaveState::Inactive);
        // The rescan after RepositoryChangedEvent indexed the new file.
        let repository = park.world_mut().resource::<DesignRepository>();
        assert!(repository.find("coaster.td6").is_some());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_cancelled_path_response_discards_design_only() {
        let root = test_root("cancel");
        let mut park = park(&root);
        park.world_mut().send_event(EnterDesignSaveModeEvent { ride: RideId(1) });
        park.tick();
        park.world_mut().send_event(SaveTrackDesignEvent { with_scenery: true });
        park.tick();
        park.world_mut().send_event(SavePathResponse { path: None });
        park.tick();

        assert!(park.world_mut().get_resource::<PendingDesign>().is_none());
        // Selection survives a cancelled picker.
        assert!(park.world_mut().get_resource::<SaveSession>().is_some());
        assert!(!root.join("coaster.td6").exists());
    }

    #[test]
    fn test_failed_build_sends_warning_notification() {
        let root = test_root("failed_build");
        let mut park = park(&root);
        park.world_mut()
            .resource_mut::<RideList>()
            .get_mut(RideId(1))
            .unwrap()
            .ratings = None;

        park.world_mut().send_event(EnterDesignSaveModeEvent { ride: RideId(1) });
        park.tick();
        park.world_mut().send_event(SaveTrackDesignEvent { with_scenery: true });
        park.tick();
        park.tick();

        assert!(park.world_mut().get_resource::<PendingDesign>().is_none());
        let log = park.world_mut().resource::<simulation::notifications::NotificationLog>();
        assert!(log
            .entries()
            .iter()
            .any(|n| n.priority == NotificationPriority::Warning));
    }
}
