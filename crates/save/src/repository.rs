//! The on-disk design repository: a directory of `.td6` files plus a cached
//! index.
//!
//! Scanning decodes every design file to extract browse metadata. Decoding
//! is the expensive part, so the index is cached next to the designs and
//! entries are reused when a file's checksum is unchanged. Unreadable files
//! are logged and skipped; they never abort a scan.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh32::xxh32;

use crate::atomic_write::atomic_write;
use crate::design_types::TrackDesign;
use crate::sawyer::decode_chunk;
use crate::save_error::SaveError;
use crate::serializer::MAX_DECODED_DESIGN_SIZE;

pub const DESIGN_FILE_EXTENSION: &str = "td6";
const INDEX_FILE_NAME: &str = "designs.idx";
const XXHASH_SEED: u32 = 0;

/// Browse metadata for one stored design file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct DesignIndexEntry {
    pub file_name: String,
    pub ride_type: u8,
    pub space_required_x: u8,
    pub space_required_y: u8,
    /// xxh32 of the encoded file, used for cache invalidation.
    pub checksum: u32,
}

/// All known designs under one root directory.
#[derive(Resource, Debug)]
pub struct DesignRepository {
    root: PathBuf,
    entries: Vec<DesignIndexEntry>,
}

impl DesignRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), entries: Vec::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[DesignIndexEntry] {
        &self.entries
    }

    pub fn find(&self, file_name: &str) -> Option<&DesignIndexEntry> {
        self.entries.iter().find(|entry| entry.file_name == file_name)
    }

    /// Path a design with the given stem would be stored at.
    pub fn design_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.{DESIGN_FILE_EXTENSION}"))
    }

    /// Rebuild the index from the directory contents.
    ///
    /// A missing root directory yields an empty index. Per-file failures are
    /// skipped with a warning.
    pub fn scan(&mut self) -> Result<(), SaveError> {
        let cache = self.load_cached_index();
        let mut entries = Vec::new();

        let dir = match fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.entries = entries;
                return Ok(());
            }
            Err(e) => return Err(SaveError::Io(e)),
        };

        for dir_entry in dir {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DESIGN_FILE_EXTENSION) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match index_file(&path, file_name, &cache) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!("skipping unreadable design {}: {e}", path.display());
                }
            }
        }

        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        self.entries = entries;
        self.store_cached_index();
        Ok(())
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE_NAME)
    }

    fn load_cached_index(&self) -> HashMap<String, DesignIndexEntry> {
        let Ok(bytes) = fs::read(self.index_path()) else {
            return HashMap::new();
        };
        match bitcode::decode::<Vec<DesignIndexEntry>>(&bytes) {
            Ok(cached) => cached
                .into_iter()
                .map(|entry| (entry.file_name.clone(), entry))
                .collect(),
            Err(_) => {
                warn!("design index cache is unreadable; rescanning everything");
                HashMap::new()
            }
        }
    }

    fn store_cached_index(&self) {
        let bytes = bitcode::encode(&self.entries);
        if let Err(e) = atomic_write(&self.index_path(), &bytes) {
            warn!("could not write design index cache: {e}");
        }
    }
}

fn index_file(
    path: &Path,
    file_name: &str,
    cache: &HashMap<String, DesignIndexEntry>,
) -> Result<DesignIndexEntry, SaveError> {
    let encoded = fs::read(path)?;
    let checksum = xxh32(&encoded, XXHASH_SEED);
    if let Some(cached) = cache.get(file_name) {
        if cached.checksum == checksum {
            return Ok(cached.clone());
        }
    }
    let decoded = decode_chunk(&encoded, MAX_DECODED_DESIGN_SIZE)?;
    let design = TrackDesign::from_bytes(&decoded)?;
    Ok(DesignIndexEntry {
        file_name: file_name.to_string(),
        ride_type: design.ride_type,
        space_required_x: design.space_required_x,
        space_required_y: design.space_required_y,
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design_types::TrackDesign;
    use crate::serializer::write_design;

    fn test_root(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/track_design_repository_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample_design(ride_type: u8) -> TrackDesign {
        let mut design = TrackDesign::empty(ride_type);
        design.space_required_x = 6;
        design.space_required_y = 9;
        design
    }

    #[test]
    fn test_missing_root_scans_empty() {
        let mut repository = DesignRepository::new(test_root("missing"));
        repository.scan().unwrap();
        assert!(repository.entries().is_empty());
    }

    #[test]
    fn test_scan_indexes_design_files() {
        let root = test_root("indexes");
        write_design(&sample_design(4), &root.join("woodie.td6")).unwrap();
        write_design(&sample_design(7), &root.join("alpine.td6")).unwrap();
        fs::write(root.join("notes.txt"), b"not a design").unwrap();

        let mut repository = DesignRepository::new(&root);
        repository.scan().unwrap();

        let names: Vec<_> =
            repository.entries().iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, vec!["alpine.td6", "woodie.td6"]);
        let woodie = repository.find("woodie.td6").unwrap();
        assert_eq!(woodie.ride_type, 4);
        assert_eq!((woodie.space_required_x, woodie.space_required_y), (6, 9));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_corrupt_file_is_skipped() {
        let root = test_root("corrupt");
        write_design(&sample_design(4), &root.join("good.td6")).unwrap();
        fs::write(root.join("bad.td6"), b"\xFF\xFF\xFF").unwrap();

        let mut repository = DesignRepository::new(&root);
        repository.scan().unwrap();
        assert_eq!(repository.entries().len(), 1);
        assert!(repository.find("good.td6").is_some());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_index_cache_survives_rescan() {
        let root = test_root("cache");
        write_design(&sample_design(4), &root.join("coaster.td6")).unwrap();

        let mut repository = DesignRepository::new(&root);
        repository.scan().unwrap();
        assert!(root.join(INDEX_FILE_NAME).exists());
        let first = repository.entries().to_vec();

        // Second scan must reuse the cache and produce the same entries.
        repository.scan().unwrap();
        assert_eq!(repository.entries(), first.as_slice());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_changed_file_invalidates_cache_entry() {
        let root = test_root("invalidate");
        write_design(&sample_design(4), &root.join("coaster.td6")).unwrap();
        let mut repository = DesignRepository::new(&root);
        repository.scan().unwrap();
        let before = repository.find("coaster.td6").unwrap().clone();

        write_design(&sample_design(9), &root.join("coaster.td6")).unwrap();
        repository.scan().unwrap();
        let after = repository.find("coaster.td6").unwrap();
        assert_eq!(after.ride_type, 9);
        assert_ne!(after.checksum, before.checksum);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_design_path_appends_extension() {
        let repository = DesignRepository::new("/tmp/designs");
        assert_eq!(
            repository.design_path("Loopmaster"),
            PathBuf::from("/tmp/designs/Loopmaster.td6")
        );
    }
}
