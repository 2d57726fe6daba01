// ---------------------------------------------------------------------------
// SaveError: typed errors for the track-design save workflow
// ---------------------------------------------------------------------------

use std::fmt;

use crate::design_types::DesignParseError;
use crate::sawyer::ChunkError;

/// Errors that can abort a track-design save (or a repository scan).
///
/// Every failure is detected synchronously and surfaced to the UI layer as a
/// notification with a specific message; there is no retry logic anywhere in
/// this subsystem.
#[derive(Debug)]
pub enum SaveError {
    /// The selection or element count exceeds the fixed array bounds.
    CapacityExceeded,
    /// A normalized coordinate falls outside the storable signed-byte range.
    CoordinateOutOfRange { value: i32 },
    /// No canonical first element (or required entrance/exit) was found.
    OriginNotFound,
    /// The ride has not been tested or has no ratings yet.
    NotTested,
    /// A placed element references an object index the registry does not know.
    UnknownObject(u8),
    /// The requested ride does not exist.
    UnknownRide(u8),
    /// Writing the encoded design to storage failed.
    Io(std::io::Error),
    /// Decoding a stored design chunk failed.
    Decode(ChunkError),
    /// A decoded design's record streams were malformed.
    Parse(DesignParseError),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::CapacityExceeded => {
                write!(f, "Unable to select additional item of scenery: too many items selected")
            }
            SaveError::CoordinateOutOfRange { value } => write!(
                f,
                "Track too large or too much scenery (coordinate {value} outside storable range)"
            ),
            SaveError::OriginNotFound => {
                write!(f, "No suitable origin element found for this ride")
            }
            SaveError::NotTested => write!(
                f,
                "The ride must be tested and rated before its design can be saved"
            ),
            SaveError::UnknownObject(index) => {
                write!(f, "Element references unregistered object index {index}")
            }
            SaveError::UnknownRide(id) => write!(f, "No ride with id {id}"),
            SaveError::Io(e) => write!(f, "I/O error: {e}"),
            SaveError::Decode(e) => write!(f, "Decoding error: {e}"),
            SaveError::Parse(e) => write!(f, "Malformed design: {e}"),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(e) => Some(e),
            SaveError::Decode(e) => Some(e),
            SaveError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<ChunkError> for SaveError {
    fn from(e: ChunkError) -> Self {
        SaveError::Decode(e)
    }
}

impl From<DesignParseError> for SaveError {
    fn from(e: DesignParseError) -> Self {
        SaveError::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_capacity() {
        let msg = format!("{}", SaveError::CapacityExceeded);
        assert!(msg.contains("too many items selected"), "got: {msg}");
    }

    #[test]
    fn test_display_out_of_range() {
        let msg = format!("{}", SaveError::CoordinateOutOfRange { value: 140 });
        assert!(msg.contains("too large"), "got: {msg}");
        assert!(msg.contains("140"), "got: {msg}");
    }

    #[test]
    fn test_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SaveError = io_err.into();
        assert!(matches!(err, SaveError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_chunk_error() {
        let err: SaveError = ChunkError::TruncatedHeader.into();
        assert!(matches!(err, SaveError::Decode(_)));
    }
}
