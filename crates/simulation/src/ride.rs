//! Ride objects and the ride list resource.
//!
//! Only the fields the track-design subsystem reads are modelled: type,
//! vehicle object, colours, operating settings, physical stats, ratings and
//! station placements.

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::config::{MAX_STATIONS_PER_RIDE, MAX_VEHICLE_COLOURS, NUM_COLOUR_SCHEMES};
use crate::coords::TileCoordsXYZD;
use crate::scenery_objects::ObjectEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RideId(pub u8);

/// Legacy numeric ride type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RideType(pub u8);

impl RideType {
    pub const MAZE: RideType = RideType(20);

    pub fn as_u8(self) -> u8 {
        self.0
    }

    pub fn is_maze(self) -> bool {
        self == Self::MAZE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VehicleColour {
    pub body: u8,
    pub trim: u8,
    pub additional: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackColour {
    pub spine: u8,
    pub rail: u8,
    pub support: u8,
}

/// Excitement/intensity/nausea, in the fixed-point scale the simulation uses
/// (hundredths).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RideRatings {
    pub excitement: i32,
    pub intensity: i32,
    pub nausea: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Station {
    /// Platform height, in height steps.
    pub height: u8,
    pub entrance: Option<TileCoordsXYZD>,
    pub exit: Option<TileCoordsXYZD>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ride {
    pub id: RideId,
    pub name: String,
    pub ride_type: RideType,
    pub vehicle_object: ObjectEntry,
    pub mode: u8,
    pub colour_scheme: u8,
    pub vehicle_colours: [VehicleColour; MAX_VEHICLE_COLOURS],
    pub track_colours: [TrackColour; NUM_COLOUR_SCHEMES],
    pub depart_flags: u8,
    pub num_trains: u8,
    pub num_cars_per_train: u8,
    pub min_waiting_time: u8,
    pub max_waiting_time: u8,
    pub operation_setting: u8,
    pub lift_hill_speed: u8,
    pub num_circuits: u8,
    pub entrance_style: u8,
    /// Speeds and length are fixed-point with 16 fractional bits.
    pub max_speed: i32,
    pub average_speed: i32,
    pub total_length: i32,
    pub max_positive_vertical_g: i32,
    pub max_negative_vertical_g: i32,
    pub max_lateral_g: i32,
    pub inversions: u8,
    pub drops: u8,
    pub highest_drop_height: u8,
    pub total_air_time: i32,
    /// `None` until the ride has been rated.
    pub ratings: Option<RideRatings>,
    pub upkeep_cost: u16,
    /// Whether the ride has completed a test run.
    pub tested: bool,
    pub stations: [Option<Station>; MAX_STATIONS_PER_RIDE],
}

impl Ride {
    /// A ride with neutral defaults; callers fill in what they need.
    pub fn new(id: RideId, ride_type: RideType) -> Self {
        Self {
            id,
            name: format!("Ride {}", id.0),
            ride_type,
            vehicle_object: ObjectEntry::default(),
            mode: 0,
            colour_scheme: 0,
            vehicle_colours: [VehicleColour::default(); MAX_VEHICLE_COLOURS],
            track_colours: [TrackColour::default(); NUM_COLOUR_SCHEMES],
            depart_flags: 0,
            num_trains: 1,
            num_cars_per_train: 1,
            min_waiting_time: 10,
            max_waiting_time: 60,
            operation_setting: 0,
            lift_hill_speed: 5,
            num_circuits: 1,
            entrance_style: 0,
            max_speed: 0,
            average_speed: 0,
            total_length: 0,
            max_positive_vertical_g: 0,
            max_negative_vertical_g: 0,
            max_lateral_g: 0,
            inversions: 0,
            drops: 0,
            highest_drop_height: 0,
            total_air_time: 0,
            ratings: None,
            upkeep_cost: 0,
            tested: false,
            stations: [None; MAX_STATIONS_PER_RIDE],
        }
    }
}

/// All rides in the park, keyed by id.
#[derive(Resource, Debug, Default)]
pub struct RideList {
    rides: BTreeMap<RideId, Ride>,
}

impl RideList {
    pub fn insert(&mut self, ride: Ride) {
        self.rides.insert(ride.id, ride);
    }

    pub fn get(&self, id: RideId) -> Option<&Ride> {
        self.rides.get(&id)
    }

    pub fn get_mut(&mut self, id: RideId) -> Option<&mut Ride> {
        self.rides.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ride> {
        self.rides.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ride_list_insert_and_get() {
        let mut rides = RideList::default();
        rides.insert(Ride::new(RideId(3), RideType(2)));
        assert!(rides.get(RideId(3)).is_some());
        assert!(rides.get(RideId(4)).is_none());
        assert_eq!(rides.iter().count(), 1);
    }

    #[test]
    fn test_maze_type_detection() {
        assert!(RideType::MAZE.is_maze());
        assert!(!RideType(2).is_maze());
    }
}
