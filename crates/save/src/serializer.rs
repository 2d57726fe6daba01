//! Assembly of a [`TrackDesign`] from the live park and its file encoding.
//!
//! `build_design` establishes the design frame (preview origin + save
//! direction), walks the ride's elements, normalizes everything into the
//! frame and fills the header from the ride object. Any failure aborts the
//! whole build; no partial design escapes. `write_design` flattens, encodes
//! and atomically writes the result, so no partial file is ever visible.

use std::path::Path;

use simulation::config::COORDS_Z_STEP;
use simulation::coords::{CoordsXYZ, Direction, TileCoordsXY, TileCoordsXYZD};
use simulation::map::TileMap;
use simulation::ride::{Ride, RideList};
use simulation::scenery_objects::SceneryObjectRegistry;
use simulation::tile_element::{TileElement, TileElementData, TrackData};
use simulation::track::{track_origin, walk_track};

use crate::atomic_write::atomic_write;
use crate::collector::SaveSession;
use crate::design_types::{
    DesignPayload, EntranceElement, MazeElement, MazeElementKind, SceneryElement, SceneryFlags,
    TrackDesign, TrackElement, TRACK_TYPE_SENTINEL_ALIAS,
};
use crate::normalize::DesignFrame;
use crate::save_error::SaveError;
use crate::sawyer::{decode_chunk, encode_chunk, Encoding};

/// Cap on stored track elements for tracked rides.
pub const MAX_TRACK_ELEMENTS: usize = 8192;

/// Cap on stored maze records, including the entrance and exit markers.
pub const MAX_MAZE_ELEMENTS: usize = 2000;

/// Encoding every design file is written with.
pub const TD6_FILE_ENCODING: Encoding = Encoding::Rotate;

/// Upper bound on a decoded design accepted when reading files back.
pub const MAX_DECODED_DESIGN_SIZE: u32 = 0x40000;

// Track types whose flags low nibble stores the halved brake speed instead
// of the seat rotation.
const TRACK_TYPE_BRAKES: u8 = 99;
const TRACK_TYPE_BLOCK_BRAKES: u8 = 100;
const TRACK_TYPE_BOOSTER: u8 = 216;

/// Build a complete design for the session's ride.
pub fn build_design(
    map: &TileMap,
    rides: &RideList,
    registry: &SceneryObjectRegistry,
    session: &SaveSession,
) -> Result<TrackDesign, SaveError> {
    let ride = rides
        .get(session.ride())
        .ok_or(SaveError::UnknownRide(session.ride().0))?;
    let ratings = ride.ratings.ok_or(SaveError::NotTested)?;
    if !ride.tested {
        return Err(SaveError::NotTested);
    }

    let mut design = TrackDesign::empty(ride.ride_type.as_u8());
    fill_header(&mut design, ride);
    design.excitement = scale_rating(ratings.excitement);
    design.intensity = scale_rating(ratings.intensity);
    design.nausea = scale_rating(ratings.nausea);

    // Bounding box of every stored tile, for the space-required fields.
    let mut bounds = TileBounds::default();

    let frame = if ride.ride_type.is_maze() {
        let (frame, elements) = build_maze_payload(map, ride, &mut bounds)?;
        design.payload = DesignPayload::Maze(elements);
        frame
    } else {
        let (frame, track, entrances) = build_track_payload(map, ride, &mut bounds)?;
        design.payload = DesignPayload::Track { track, entrances };
        frame
    };

    for &id in session.selected() {
        let Some((coord, element)) = map.element(id) else {
            continue;
        };
        if let Some(record) = scenery_element(registry, &frame, coord, element)? {
            bounds.include(record.x, record.y);
            design.scenery.push(record);
        }
    }

    let (space_x, space_y) = bounds.extent();
    design.space_required_x = space_x;
    design.space_required_y = space_y;
    Ok(design)
}

/// Flatten, encode and atomically write a design.
pub fn write_design(design: &TrackDesign, path: &Path) -> Result<(), SaveError> {
    let bytes = design.to_bytes();
    let chunk = encode_chunk(TD6_FILE_ENCODING, &bytes);
    atomic_write(path, &chunk)?;
    Ok(())
}

/// Read a stored design file back into memory.
pub fn read_design(path: &Path) -> Result<TrackDesign, SaveError> {
    let chunk = std::fs::read(path)?;
    let bytes = decode_chunk(&chunk, MAX_DECODED_DESIGN_SIZE)?;
    Ok(TrackDesign::from_bytes(&bytes)?)
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

fn fill_header(design: &mut TrackDesign, ride: &Ride) {
    design.mode = ride.mode;
    design.colour_scheme = ride.colour_scheme & 3;
    design.vehicle_colours = ride.vehicle_colours;
    design.entrance_style = ride.entrance_style;
    design.total_air_time = clamp_u8(ride.total_air_time / 8);
    design.depart_flags = ride.depart_flags;
    design.number_of_trains = ride.num_trains;
    design.number_of_cars_per_train = ride.num_cars_per_train;
    design.min_waiting_time = ride.min_waiting_time;
    design.max_waiting_time = ride.max_waiting_time;
    design.operation_setting = ride.operation_setting;
    design.max_speed = (ride.max_speed >> 16) as i8;
    design.average_speed = (ride.average_speed >> 16) as i8;
    design.ride_length = (ride.total_length >> 16).clamp(0, i32::from(u16::MAX)) as u16;
    design.max_positive_vertical_g = clamp_u8(ride.max_positive_vertical_g / 32);
    design.max_negative_vertical_g = clamp_u8(ride.max_negative_vertical_g / 32);
    design.max_lateral_g = clamp_u8(ride.max_lateral_g / 32);
    design.inversions = ride.inversions;
    design.drops = ride.drops;
    design.highest_drop_height = ride.highest_drop_height;
    design.upkeep_cost = ride.upkeep_cost;
    for (i, colour) in ride.track_colours.iter().enumerate() {
        design.track_spine_colours[i] = colour.spine;
        design.track_rail_colours[i] = colour.rail;
        design.track_support_colours[i] = colour.support;
    }
    design.vehicle_object = ride.vehicle_object;
    design.lift_hill_speed = ride.lift_hill_speed & 0x1F;
    design.num_circuits = ride.num_circuits & 0x07;
}

fn scale_rating(value: i32) -> u8 {
    clamp_u8(value / 10)
}

fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, i32::from(u8::MAX)) as u8
}

// ---------------------------------------------------------------------------
// Tracked rides
// ---------------------------------------------------------------------------

fn build_track_payload(
    map: &TileMap,
    ride: &Ride,
    bounds: &mut TileBounds,
) -> Result<(DesignFrame, Vec<TrackElement>, Vec<EntranceElement>), SaveError> {
    let (origin_coord, origin_element) =
        track_origin(map, ride.id).ok_or(SaveError::OriginNotFound)?;
    let save_direction = match origin_element.as_track() {
        Some(track) => track.direction,
        None => return Err(SaveError::OriginNotFound),
    };
    let origin = CoordsXYZ::new(
        origin_coord.world().x,
        origin_coord.world().y,
        i32::from(origin_element.base_height) * COORDS_Z_STEP,
    );
    let frame = DesignFrame::new(origin, save_direction);

    let mut track = Vec::new();
    let walk = walk_track(map, ride.id).ok_or(SaveError::OriginNotFound)?;
    for (coord, element) in walk {
        let Some(data) = element.as_track() else {
            continue;
        };
        if track.len() >= MAX_TRACK_ELEMENTS {
            return Err(SaveError::CapacityExceeded);
        }
        let (x, y) = frame.tile_offsets(coord.world())?;
        bounds.include(x, y);
        track.push(TrackElement {
            track_type: stored_track_type(data.track_type),
            flags: pack_track_flags(data),
        });
    }

    let mut entrances = Vec::new();
    for station in ride.stations.iter().flatten() {
        if let Some(location) = station.entrance {
            let (tx, ty) = frame.tile_offsets(location.xy().world())?;
            bounds.include(tx, ty);
            entrances.push(entrance_record(&frame, location, false)?);
        }
    }
    for station in ride.stations.iter().flatten() {
        if let Some(location) = station.exit {
            let (tx, ty) = frame.tile_offsets(location.xy().world())?;
            bounds.include(tx, ty);
            entrances.push(entrance_record(&frame, location, true)?);
        }
    }

    Ok((frame, track, entrances))
}

fn entrance_record(
    frame: &DesignFrame,
    location: TileCoordsXYZD,
    is_exit: bool,
) -> Result<EntranceElement, SaveError> {
    let world = location.xy().world();
    let (x, y) = frame.world_offsets(world)?;
    Ok(EntranceElement {
        z: frame.z_offset(location.z * COORDS_Z_STEP)?,
        direction: frame.rotate_direction(location.direction),
        is_exit,
        x,
        y,
    })
}

/// Track type 0xFF would read back as a stream terminator; alias it.
fn stored_track_type(track_type: u8) -> u8 {
    if track_type == 0xFF {
        TRACK_TYPE_SENTINEL_ALIAS
    } else {
        track_type
    }
}

fn pack_track_flags(track: &TrackData) -> u8 {
    let low_nibble = if matches!(
        track.track_type,
        TRACK_TYPE_BRAKES | TRACK_TYPE_BLOCK_BRAKES | TRACK_TYPE_BOOSTER
    ) {
        track.brake_speed >> 1
    } else {
        track.seat_rotation
    };
    let mut flags = low_nibble & 0x0F;
    flags |= (track.colour_scheme & 3) << 4;
    if track.inverted {
        flags |= 1 << 6;
    }
    if track.has_chain {
        flags |= 1 << 7;
    }
    flags
}

// ---------------------------------------------------------------------------
// Maze rides
// ---------------------------------------------------------------------------

fn build_maze_payload(
    map: &TileMap,
    ride: &Ride,
    bounds: &mut TileBounds,
) -> Result<(DesignFrame, Vec<MazeElement>), SaveError> {
    // Maze cells have no inherent orientation; the frame is anchored to the
    // first cell in scan order and never rotated.
    let mut origin: Option<(TileCoordsXY, u8)> = None;
    let mut cells = Vec::new();
    for coord in map.iter_coords() {
        for element in map.elements_at(coord) {
            if let Some(track) = element.as_track() {
                if track.ride == ride.id {
                    if origin.is_none() {
                        origin = Some((coord, element.base_height));
                    }
                    cells.push((coord, track.maze_entry));
                }
            }
        }
    }
    let (origin_coord, origin_height) = origin.ok_or(SaveError::OriginNotFound)?;
    let frame = DesignFrame::new(
        CoordsXYZ::new(
            origin_coord.world().x,
            origin_coord.world().y,
            i32::from(origin_height) * COORDS_Z_STEP,
        ),
        Direction::North,
    );

    let mut elements = Vec::new();
    for (coord, entry) in cells {
        if elements.len() + 2 >= MAX_MAZE_ELEMENTS {
            return Err(SaveError::CapacityExceeded);
        }
        let (x, y) = frame.tile_offsets(coord.world())?;
        bounds.include(x, y);
        elements.push(MazeElement { x, y, kind: MazeElementKind::Walls(entry) });
    }

    // A maze design is unusable without both its entrance and exit.
    let station = ride
        .stations
        .iter()
        .flatten()
        .next()
        .ok_or(SaveError::OriginNotFound)?;
    let entrance = station.entrance.ok_or(SaveError::OriginNotFound)?;
    let exit = station.exit.ok_or(SaveError::OriginNotFound)?;
    for (location, is_exit) in [(entrance, false), (exit, true)] {
        let (x, y) = frame.tile_offsets(location.xy().world())?;
        bounds.include(x, y);
        let direction = frame.rotate_direction(location.direction);
        let kind = if is_exit {
            MazeElementKind::Exit { direction }
        } else {
            MazeElementKind::Entrance { direction }
        };
        elements.push(MazeElement { x, y, kind });
    }

    Ok((frame, elements))
}

// ---------------------------------------------------------------------------
// Scenery
// ---------------------------------------------------------------------------

/// Build one stored scenery record, or `None` for large scenery segments
/// past the first (the object is stored once, from its origin segment).
fn scenery_element(
    registry: &SceneryObjectRegistry,
    frame: &DesignFrame,
    coord: TileCoordsXY,
    element: &TileElement,
) -> Result<Option<SceneryElement>, SaveError> {
    let (object, flags, primary, secondary) = match &element.data {
        TileElementData::SmallScenery(data) => {
            let entry = registry
                .small(data.object)
                .ok_or(SaveError::UnknownObject(data.object))?;
            let flags = SceneryFlags::Quadrant {
                direction: data.direction,
                quadrant: data.quadrant,
            };
            (*entry, flags, data.primary_colour, data.secondary_colour)
        }
        TileElementData::Wall(data) => {
            let entry = registry
                .wall(data.object)
                .ok_or(SaveError::UnknownObject(data.object))?;
            let flags = SceneryFlags::Wall {
                direction: data.direction,
                tertiary_colour: data.tertiary_colour,
            };
            (*entry, flags, data.primary_colour, data.secondary_colour)
        }
        TileElementData::LargeScenery(data) => {
            if data.sequence != 0 {
                return Ok(None);
            }
            let entry = registry
                .large(data.object)
                .ok_or(SaveError::UnknownObject(data.object))?;
            let flags = SceneryFlags::Quadrant { direction: data.direction, quadrant: 0 };
            (entry.object, flags, data.primary_colour, data.secondary_colour)
        }
        TileElementData::Path(data) => {
            let entry = registry
                .path(data.object)
                .ok_or(SaveError::UnknownObject(data.object))?;
            let flags = SceneryFlags::Path {
                edges: data.edges,
                sloped: data.sloped,
                slope_direction: data.slope_direction,
                is_queue: data.is_queue,
            };
            (*entry, flags, 0, 0)
        }
        _ => return Ok(None),
    };

    let (x, y) = frame.tile_offsets(coord.world())?;
    Ok(Some(SceneryElement {
        object,
        x,
        y,
        z: frame.z_offset(i32::from(element.base_height) * COORDS_Z_STEP)?,
        flags: flags.rotated(frame.save_direction),
        primary_colour: primary,
        secondary_colour: secondary,
    }))
}

// ---------------------------------------------------------------------------
// Space required
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TileBounds {
    range: Option<(i8, i8, i8, i8)>,
}

impl TileBounds {
    fn include(&mut self, x: i8, y: i8) {
        self.range = Some(match self.range {
            None => (x, x, y, y),
            Some((min_x, max_x, min_y, max_y)) => {
                (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
            }
        });
    }

    /// Width and height of the covered area, in tiles.
    fn extent(&self) -> (u8, u8) {
        match self.range {
            None => (0, 0),
            Some((min_x, max_x, min_y, max_y)) => (
                (i32::from(max_x) - i32::from(min_x) + 1) as u8,
                (i32::from(max_y) - i32::from(min_y) + 1) as u8,
            ),
        }
    }
}
