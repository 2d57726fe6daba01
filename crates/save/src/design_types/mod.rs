//! In-memory representation of a TD6 track design and its byte layout.
//!
//! A serialized design is a fixed 0xA3-byte header followed by
//! sentinel-terminated element streams: maze cells (4-byte records, all-zero
//! terminator) for maze rides, or track elements (2-byte records, 0xFF
//! terminator) plus entrance records (6 bytes, 0xFF terminator) for tracked
//! rides, then scenery records (22 bytes, 0xFF terminator) in either case.
//! All multi-byte fields are little-endian.

pub mod scenery_flags;

use std::fmt;

use simulation::config::{MAX_VEHICLE_COLOURS, NUM_COLOUR_SCHEMES};
use simulation::coords::Direction;
use simulation::ride::{RideType, VehicleColour};
use simulation::scenery_objects::{ObjectCategory, ObjectEntry};

pub use scenery_flags::SceneryFlags;

/// Fixed header length of a decoded design.
pub const TD6_HEADER_SIZE: usize = 0xA3;

/// Stream terminator for track, entrance and scenery streams.
pub const STREAM_TERMINATOR: u8 = 0xFF;

/// Alias stored in place of track type 0xFF, which would collide with the
/// stream terminator.
pub const TRACK_TYPE_SENTINEL_ALIAS: u8 = 101;

const VERSION_BIT: u8 = 1 << 3;

// Header field offsets.
const OFF_RIDE_TYPE: usize = 0x00;
const OFF_VEHICLE_TYPE: usize = 0x01;
const OFF_FLAGS: usize = 0x02;
const OFF_MODE: usize = 0x06;
const OFF_VERSION_COLOUR_SCHEME: usize = 0x07;
const OFF_VEHICLE_COLOURS: usize = 0x08;
const OFF_ENTRANCE_STYLE: usize = 0x49;
const OFF_AIR_TIME: usize = 0x4A;
const OFF_DEPART_FLAGS: usize = 0x4B;
const OFF_NUM_TRAINS: usize = 0x4C;
const OFF_CARS_PER_TRAIN: usize = 0x4D;
const OFF_MIN_WAIT: usize = 0x4E;
const OFF_MAX_WAIT: usize = 0x4F;
const OFF_OPERATION: usize = 0x50;
const OFF_MAX_SPEED: usize = 0x51;
const OFF_AVERAGE_SPEED: usize = 0x52;
const OFF_RIDE_LENGTH: usize = 0x53;
const OFF_MAX_POSITIVE_G: usize = 0x55;
const OFF_MAX_NEGATIVE_G: usize = 0x56;
const OFF_MAX_LATERAL_G: usize = 0x57;
const OFF_INVERSIONS: usize = 0x58;
const OFF_DROPS: usize = 0x59;
const OFF_HIGHEST_DROP: usize = 0x5A;
const OFF_EXCITEMENT: usize = 0x5B;
const OFF_INTENSITY: usize = 0x5C;
const OFF_NAUSEA: usize = 0x5D;
const OFF_UPKEEP: usize = 0x5E;
const OFF_SPINE_COLOURS: usize = 0x60;
const OFF_RAIL_COLOURS: usize = 0x64;
const OFF_SUPPORT_COLOURS: usize = 0x68;
const OFF_FLAGS2: usize = 0x6C;
const OFF_VEHICLE_OBJECT: usize = 0x70;
const OFF_SPACE_REQUIRED_X: usize = 0x80;
const OFF_SPACE_REQUIRED_Y: usize = 0x81;
const OFF_ADDITIONAL_COLOURS: usize = 0x82;
const OFF_LIFT_SPEED_CIRCUITS: usize = 0xA2;

const MAZE_RECORD_SIZE: usize = 4;
const TRACK_RECORD_SIZE: usize = 2;
const ENTRANCE_RECORD_SIZE: usize = 6;
const SCENERY_RECORD_SIZE: usize = ObjectEntry::ENCODED_SIZE + 6;

/// Maze entrance/exit marker type bytes.
const MAZE_TYPE_ENTRANCE: u8 = 0x08;
const MAZE_TYPE_EXIT: u8 = 0x80;

// ---------------------------------------------------------------------------
// Element records
// ---------------------------------------------------------------------------

/// One stored track segment: legacy track type plus a packed flags byte.
///
/// The flags byte holds the colour scheme (bits 4..=5), chain lift (bit 7),
/// inversion (bit 6) and, in the low nibble, either the seat rotation or the
/// halved brake speed depending on track type. The serializer packs it; this
/// type just carries the two bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackElement {
    pub track_type: u8,
    pub flags: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MazeElementKind {
    /// One maze tile's wall bitmap.
    Walls(u16),
    Entrance { direction: Direction },
    Exit { direction: Direction },
}

/// One stored maze record: design-relative tile plus cell payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MazeElement {
    pub x: i8,
    pub y: i8,
    pub kind: MazeElementKind,
}

impl MazeElement {
    fn write(self, out: &mut Vec<u8>) {
        out.push(self.x as u8);
        out.push(self.y as u8);
        match self.kind {
            MazeElementKind::Walls(entry) => out.extend_from_slice(&entry.to_le_bytes()),
            MazeElementKind::Entrance { direction } => {
                out.push(direction.as_u8());
                out.push(MAZE_TYPE_ENTRANCE);
            }
            MazeElementKind::Exit { direction } => {
                out.push(direction.as_u8());
                out.push(MAZE_TYPE_EXIT);
            }
        }
    }

    fn read(record: &[u8; MAZE_RECORD_SIZE]) -> Self {
        let kind = match record[3] {
            MAZE_TYPE_ENTRANCE => MazeElementKind::Entrance {
                direction: Direction::from_u8(record[2]),
            },
            MAZE_TYPE_EXIT => MazeElementKind::Exit {
                direction: Direction::from_u8(record[2]),
            },
            _ => MazeElementKind::Walls(u16::from_le_bytes([record[2], record[3]])),
        };
        Self { x: record[0] as i8, y: record[1] as i8, kind }
    }
}

/// One stored station entrance or exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntranceElement {
    /// Height in height steps, origin-relative.
    pub z: i8,
    pub direction: Direction,
    pub is_exit: bool,
    /// Position in world units, origin-relative and frame-rotated.
    pub x: i16,
    pub y: i16,
}

impl EntranceElement {
    fn write(self, out: &mut Vec<u8>) {
        out.push(self.z as u8);
        let mut direction = self.direction.as_u8();
        if self.is_exit {
            direction |= 1 << 7;
        }
        out.push(direction);
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
    }

    fn read(record: &[u8; ENTRANCE_RECORD_SIZE]) -> Self {
        Self {
            z: record[0] as i8,
            direction: Direction::from_u8(record[1] & 3),
            is_exit: record[1] & (1 << 7) != 0,
            x: i16::from_le_bytes([record[2], record[3]]),
            y: i16::from_le_bytes([record[4], record[5]]),
        }
    }
}

/// One stored scenery placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneryElement {
    pub object: ObjectEntry,
    /// Tile offsets from the preview origin.
    pub x: i8,
    pub y: i8,
    /// Height steps from the origin height.
    pub z: i8,
    pub flags: SceneryFlags,
    pub primary_colour: u8,
    pub secondary_colour: u8,
}

impl SceneryElement {
    fn write(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.object.to_bytes());
        out.push(self.x as u8);
        out.push(self.y as u8);
        out.push(self.z as u8);
        out.push(self.flags.pack());
        out.push(self.primary_colour);
        out.push(self.secondary_colour);
    }

    fn read(record: &[u8; SCENERY_RECORD_SIZE]) -> Result<Self, DesignParseError> {
        let mut object_bytes = [0u8; ObjectEntry::ENCODED_SIZE];
        object_bytes.copy_from_slice(&record[..ObjectEntry::ENCODED_SIZE]);
        let object = ObjectEntry::from_bytes(object_bytes);
        let rest = &record[ObjectEntry::ENCODED_SIZE..];
        let flags_byte = rest[3];
        let flags = match object.category() {
            Some(ObjectCategory::Path) => SceneryFlags::unpack_path(flags_byte),
            Some(ObjectCategory::Wall) => SceneryFlags::unpack_wall(flags_byte),
            Some(ObjectCategory::SmallScenery) | Some(ObjectCategory::LargeScenery) => {
                SceneryFlags::unpack_quadrant(flags_byte)
            }
            _ => return Err(DesignParseError::UnknownSceneryCategory(object.object_type())),
        };
        Ok(Self {
            object,
            x: rest[0] as i8,
            y: rest[1] as i8,
            z: rest[2] as i8,
            flags,
            primary_colour: rest[4],
            secondary_colour: rest[5],
        })
    }
}

/// The ride-specific element stream of a design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesignPayload {
    Maze(Vec<MazeElement>),
    Track {
        track: Vec<TrackElement>,
        entrances: Vec<EntranceElement>,
    },
}

// ---------------------------------------------------------------------------
// TrackDesign
// ---------------------------------------------------------------------------

/// A complete in-memory track design, assembled transiently during a save
/// (or parsed from a stored file by the repository).
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDesign {
    pub ride_type: u8,
    pub vehicle_type: u8,
    pub flags: u32,
    pub mode: u8,
    pub colour_scheme: u8,
    pub vehicle_colours: [VehicleColour; MAX_VEHICLE_COLOURS],
    pub entrance_style: u8,
    pub total_air_time: u8,
    pub depart_flags: u8,
    pub number_of_trains: u8,
    pub number_of_cars_per_train: u8,
    pub min_waiting_time: u8,
    pub max_waiting_time: u8,
    pub operation_setting: u8,
    pub max_speed: i8,
    pub average_speed: i8,
    pub ride_length: u16,
    pub max_positive_vertical_g: u8,
    pub max_negative_vertical_g: u8,
    pub max_lateral_g: u8,
    pub inversions: u8,
    pub drops: u8,
    pub highest_drop_height: u8,
    pub excitement: u8,
    pub intensity: u8,
    pub nausea: u8,
    pub upkeep_cost: u16,
    pub track_spine_colours: [u8; NUM_COLOUR_SCHEMES],
    pub track_rail_colours: [u8; NUM_COLOUR_SCHEMES],
    pub track_support_colours: [u8; NUM_COLOUR_SCHEMES],
    pub flags2: u32,
    pub vehicle_object: ObjectEntry,
    /// Bounding box of the design in tiles.
    pub space_required_x: u8,
    pub space_required_y: u8,
    pub lift_hill_speed: u8,
    pub num_circuits: u8,
    pub payload: DesignPayload,
    pub scenery: Vec<SceneryElement>,
}

impl TrackDesign {
    /// A design with neutral header fields; the serializer fills them in.
    pub fn empty(ride_type: u8) -> Self {
        let payload = if RideType(ride_type).is_maze() {
            DesignPayload::Maze(Vec::new())
        } else {
            DesignPayload::Track { track: Vec::new(), entrances: Vec::new() }
        };
        Self {
            ride_type,
            vehicle_type: 0,
            flags: 0,
            mode: 0,
            colour_scheme: 0,
            vehicle_colours: [VehicleColour::default(); MAX_VEHICLE_COLOURS],
            entrance_style: 0,
            total_air_time: 0,
            depart_flags: 0,
            number_of_trains: 0,
            number_of_cars_per_train: 0,
            min_waiting_time: 0,
            max_waiting_time: 0,
            operation_setting: 0,
            max_speed: 0,
            average_speed: 0,
            ride_length: 0,
            max_positive_vertical_g: 0,
            max_negative_vertical_g: 0,
            max_lateral_g: 0,
            inversions: 0,
            drops: 0,
            highest_drop_height: 0,
            excitement: 0,
            intensity: 0,
            nausea: 0,
            upkeep_cost: 0,
            track_spine_colours: [0; NUM_COLOUR_SCHEMES],
            track_rail_colours: [0; NUM_COLOUR_SCHEMES],
            track_support_colours: [0; NUM_COLOUR_SCHEMES],
            flags2: 0,
            vehicle_object: ObjectEntry::default(),
            space_required_x: 0,
            space_required_y: 0,
            lift_hill_speed: 0,
            num_circuits: 1,
            payload,
            scenery: Vec::new(),
        }
    }

    /// Flatten the design into the decoded TD6 byte layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; TD6_HEADER_SIZE];
        out[OFF_RIDE_TYPE] = self.ride_type;
        out[OFF_VEHICLE_TYPE] = self.vehicle_type;
        out[OFF_FLAGS..OFF_FLAGS + 4].copy_from_slice(&self.flags.to_le_bytes());
        out[OFF_MODE] = self.mode;
        out[OFF_VERSION_COLOUR_SCHEME] = (self.colour_scheme & 3) | VERSION_BIT;
        for (i, colour) in self.vehicle_colours.iter().enumerate() {
            out[OFF_VEHICLE_COLOURS + i * 2] = colour.body;
            out[OFF_VEHICLE_COLOURS + i * 2 + 1] = colour.trim;
            out[OFF_ADDITIONAL_COLOURS + i] = colour.additional;
        }
        out[OFF_ENTRANCE_STYLE] = self.entrance_style;
        out[OFF_AIR_TIME] = self.total_air_time;
        out[OFF_DEPART_FLAGS] = self.depart_flags;
        out[OFF_NUM_TRAINS] = self.number_of_trains;
        out[OFF_CARS_PER_TRAIN] = self.number_of_cars_per_train;
        out[OFF_MIN_WAIT] = self.min_waiting_time;
        out[OFF_MAX_WAIT] = self.max_waiting_time;
        out[OFF_OPERATION] = self.operation_setting;
        out[OFF_MAX_SPEED] = self.max_speed as u8;
        out[OFF_AVERAGE_SPEED] = self.average_speed as u8;
        out[OFF_RIDE_LENGTH..OFF_RIDE_LENGTH + 2]
            .copy_from_slice(&self.ride_length.to_le_bytes());
        out[OFF_MAX_POSITIVE_G] = self.max_positive_vertical_g;
        out[OFF_MAX_NEGATIVE_G] = self.max_negative_vertical_g;
        out[OFF_MAX_LATERAL_G] = self.max_lateral_g;
        out[OFF_INVERSIONS] = self.inversions;
        out[OFF_DROPS] = self.drops;
        out[OFF_HIGHEST_DROP] = self.highest_drop_height;
        out[OFF_EXCITEMENT] = self.excitement;
        out[OFF_INTENSITY] = self.intensity;
        out[OFF_NAUSEA] = self.nausea;
        out[OFF_UPKEEP..OFF_UPKEEP + 2].copy_from_slice(&self.upkeep_cost.to_le_bytes());
        out[OFF_SPINE_COLOURS..OFF_SPINE_COLOURS + NUM_COLOUR_SCHEMES]
            .copy_from_slice(&self.track_spine_colours);
        out[OFF_RAIL_COLOURS..OFF_RAIL_COLOURS + NUM_COLOUR_SCHEMES]
            .copy_from_slice(&self.track_rail_colours);
        out[OFF_SUPPORT_COLOURS..OFF_SUPPORT_COLOURS + NUM_COLOUR_SCHEMES]
            .copy_from_slice(&self.track_support_colours);
        out[OFF_FLAGS2..OFF_FLAGS2 + 4].copy_from_slice(&self.flags2.to_le_bytes());
        out[OFF_VEHICLE_OBJECT..OFF_VEHICLE_OBJECT + ObjectEntry::ENCODED_SIZE]
            .copy_from_slice(&self.vehicle_object.to_bytes());
        out[OFF_SPACE_REQUIRED_X] = self.space_required_x;
        out[OFF_SPACE_REQUIRED_Y] = self.space_required_y;
        out[OFF_LIFT_SPEED_CIRCUITS] =
            (self.lift_hill_speed & 0x1F) | (self.num_circuits << 5);

        match &self.payload {
            DesignPayload::Maze(elements) => {
                for element in elements {
                    element.write(&mut out);
                }
                out.extend_from_slice(&[0; MAZE_RECORD_SIZE]);
            }
            DesignPayload::Track { track, entrances } => {
                for element in track {
                    out.push(element.track_type);
                    out.push(element.flags);
                }
                out.push(STREAM_TERMINATOR);
                for entrance in entrances {
                    entrance.write(&mut out);
                }
                out.push(STREAM_TERMINATOR);
            }
        }
        for element in &self.scenery {
            element.write(&mut out);
        }
        out.push(STREAM_TERMINATOR);
        out
    }

    /// Parse a decoded TD6 byte stream.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DesignParseError> {
        if bytes.len() < TD6_HEADER_SIZE {
            return Err(DesignParseError::TruncatedHeader);
        }
        let mut design = Self::empty(bytes[OFF_RIDE_TYPE]);
        design.vehicle_type = bytes[OFF_VEHICLE_TYPE];
        design.flags = u32::from_le_bytes([
            bytes[OFF_FLAGS],
            bytes[OFF_FLAGS + 1],
            bytes[OFF_FLAGS + 2],
            bytes[OFF_FLAGS + 3],
        ]);
        design.mode = bytes[OFF_MODE];
        design.colour_scheme = bytes[OFF_VERSION_COLOUR_SCHEME] & 3;
        for i in 0..MAX_VEHICLE_COLOURS {
            design.vehicle_colours[i] = VehicleColour {
                body: bytes[OFF_VEHICLE_COLOURS + i * 2],
                trim: bytes[OFF_VEHICLE_COLOURS + i * 2 + 1],
                additional: bytes[OFF_ADDITIONAL_COLOURS + i],
            };
        }
        design.entrance_style = bytes[OFF_ENTRANCE_STYLE];
        design.total_air_time = bytes[OFF_AIR_TIME];
        design.depart_flags = bytes[OFF_DEPART_FLAGS];
        design.number_of_trains = bytes[OFF_NUM_TRAINS];
        design.number_of_cars_per_train = bytes[OFF_CARS_PER_TRAIN];
        design.min_waiting_time = bytes[OFF_MIN_WAIT];
        design.max_waiting_time = bytes[OFF_MAX_WAIT];
        design.operation_setting = bytes[OFF_OPERATION];
        design.max_speed = bytes[OFF_MAX_SPEED] as i8;
        design.average_speed = bytes[OFF_AVERAGE_SPEED] as i8;
        design.ride_length =
            u16::from_le_bytes([bytes[OFF_RIDE_LENGTH], bytes[OFF_RIDE_LENGTH + 1]]);
        design.max_positive_vertical_g = bytes[OFF_MAX_POSITIVE_G];
        design.max_negative_vertical_g = bytes[OFF_MAX_NEGATIVE_G];
        design.max_lateral_g = bytes[OFF_MAX_LATERAL_G];
        design.inversions = bytes[OFF_INVERSIONS];
        design.drops = bytes[OFF_DROPS];
        design.highest_drop_height = bytes[OFF_HIGHEST_DROP];
        design.excitement = bytes[OFF_EXCITEMENT];
        design.intensity = bytes[OFF_INTENSITY];
        design.nausea = bytes[OFF_NAUSEA];
        design.upkeep_cost = u16::from_le_bytes([bytes[OFF_UPKEEP], bytes[OFF_UPKEEP + 1]]);
        design.track_spine_colours
            .copy_from_slice(&bytes[OFF_SPINE_COLOURS..OFF_SPINE_COLOURS + NUM_COLOUR_SCHEMES]);
        design.track_rail_colours
            .copy_from_slice(&bytes[OFF_RAIL_COLOURS..OFF_RAIL_COLOURS + NUM_COLOUR_SCHEMES]);
        design.track_support_colours.copy_from_slice(
            &bytes[OFF_SUPPORT_COLOURS..OFF_SUPPORT_COLOURS + NUM_COLOUR_SCHEMES],
        );
        design.flags2 = u32::from_le_bytes([
            bytes[OFF_FLAGS2],
            bytes[OFF_FLAGS2 + 1],
            bytes[OFF_FLAGS2 + 2],
            bytes[OFF_FLAGS2 + 3],
        ]);
        let mut object_bytes = [0u8; ObjectEntry::ENCODED_SIZE];
        object_bytes.copy_from_slice(
            &bytes[OFF_VEHICLE_OBJECT..OFF_VEHICLE_OBJECT + ObjectEntry::ENCODED_SIZE],
        );
        design.vehicle_object = ObjectEntry::from_bytes(object_bytes);
        design.space_required_x = bytes[OFF_SPACE_REQUIRED_X];
        design.space_required_y = bytes[OFF_SPACE_REQUIRED_Y];
        design.lift_hill_speed = bytes[OFF_LIFT_SPEED_CIRCUITS] & 0x1F;
        design.num_circuits = bytes[OFF_LIFT_SPEED_CIRCUITS] >> 5;

        let mut cursor = Cursor { bytes, pos: TD6_HEADER_SIZE };
        if RideType(design.ride_type).is_maze() {
            let mut elements = Vec::new();
            loop {
                let record: [u8; MAZE_RECORD_SIZE] = cursor.take()?;
                if record == [0; MAZE_RECORD_SIZE] {
                    break;
                }
                elements.push(MazeElement::read(&record));
            }
            design.payload = DesignPayload::Maze(elements);
        } else {
            let mut track = Vec::new();
            while cursor.peek()? != STREAM_TERMINATOR {
                let record: [u8; TRACK_RECORD_SIZE] = cursor.take()?;
                track.push(TrackElement { track_type: record[0], flags: record[1] });
            }
            cursor.skip(1)?;
            let mut entrances = Vec::new();
            while cursor.peek()? != STREAM_TERMINATOR {
                let record: [u8; ENTRANCE_RECORD_SIZE] = cursor.take()?;
                entrances.push(EntranceElement::read(&record));
            }
            cursor.skip(1)?;
            design.payload = DesignPayload::Track { track, entrances };
        }
        while cursor.peek()? != STREAM_TERMINATOR {
            let record: [u8; SCENERY_RECORD_SIZE] = cursor.take()?;
            design.scenery.push(SceneryElement::read(&record)?);
        }
        Ok(design)
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Result<u8, DesignParseError> {
        self.bytes.get(self.pos).copied().ok_or(DesignParseError::UnexpectedEnd)
    }

    fn skip(&mut self, n: usize) -> Result<(), DesignParseError> {
        if self.pos + n > self.bytes.len() {
            return Err(DesignParseError::UnexpectedEnd);
        }
        self.pos += n;
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DesignParseError> {
        let end = self.pos + N;
        if end > self.bytes.len() {
            return Err(DesignParseError::UnexpectedEnd);
        }
        let mut record = [0u8; N];
        record.copy_from_slice(&self.bytes[self.pos..end]);
        self.pos = end;
        Ok(record)
    }
}

/// Errors raised while parsing a decoded design byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignParseError {
    /// Shorter than the fixed header.
    TruncatedHeader,
    /// A stream ended without its terminator.
    UnexpectedEnd,
    /// A scenery record's object entry is not a known scenery category.
    UnknownSceneryCategory(u8),
}

impl fmt::Display for DesignParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesignParseError::TruncatedHeader => write!(f, "design header truncated"),
            DesignParseError::UnexpectedEnd => {
                write!(f, "element stream ended without terminator")
            }
            DesignParseError::UnknownSceneryCategory(object_type) => {
                write!(f, "scenery record has non-scenery object type {object_type}")
            }
        }
    }
}

impl std::error::Error for DesignParseError {}
