//! Fixed world constants shared by the park model and the save subsystem.

/// World units per map tile edge.
pub const COORDS_XY_STEP: i32 = 32;

/// World units per height step (`base_height` is measured in these).
pub const COORDS_Z_STEP: i32 = 8;

/// Map edge length, in tiles.
pub const MAP_SIZE: i32 = 256;

/// Maximum number of stations a ride can have.
pub const MAX_STATIONS_PER_RIDE: usize = 4;

/// Number of per-vehicle colour slots a ride carries.
pub const MAX_VEHICLE_COLOURS: usize = 32;

/// Number of track colour schemes a ride carries.
pub const NUM_COLOUR_SCHEMES: usize = 4;
