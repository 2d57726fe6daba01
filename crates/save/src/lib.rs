//! Track-design saving: selection, normalization, the TD6 byte format and
//! its chunk encoding, plus the on-disk design repository.

mod atomic_write;
pub mod collector;
pub mod design_types;
pub mod normalize;
pub mod repository;
mod save_error;
mod save_plugin;
pub mod sawyer;
#[cfg(test)]
mod sawyer_fuzz_tests;
pub mod serializer;

pub use atomic_write::atomic_write;
pub use collector::{SaveSession, MAX_SAVED_ELEMENTS, NEARBY_SCENERY_DISTANCE};
pub use repository::{DesignIndexEntry, DesignRepository};
pub use save_error::SaveError;
pub use save_plugin::{
    EnterDesignSaveModeEvent, ExitDesignSaveModeEvent, PendingDesign, RepositoryChangedEvent,
    SavePathRequest, SavePathResponse, SavePlugin, SaveTrackDesignEvent, SelectNearbySceneryEvent,
    ToggleSceneryEvent,
};
