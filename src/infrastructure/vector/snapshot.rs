//! On-disk snapshot of the flat index and its id mapping.
//!
//! The two artifacts form one logical unit. Each is written to a temporary
//! sibling and renamed into place, index first, so a crash never leaves a
//! half-written file behind. A crash between the two renames leaves a newer
//! index next to an older mapping; both carry the save generation so the
//! mismatch is detected and logged on load.
//!
//! Index blob layout (little-endian):
//!
//! ```text
//! magic "SMDXIDX1" | u32 version | u32 dimension | u64 generation | u64 count | count * dimension f32
//! ```

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::flat_index::FlatIndex;
use super::id_mapping::IdMapping;
use crate::domain::models::{DocumentKey, IndexConfig};

const INDEX_MAGIC: &[u8; 8] = b"SMDXIDX1";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8 + 4 + 4 + 8 + 8;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Corrupt snapshot artifact {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("Snapshot dimension {found} does not match configured dimension {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Failed to serialize mapping: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where a loaded snapshot came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOrigin {
    /// Both artifacts were read from disk.
    Disk,
    /// No artifacts existed; started blank.
    Fresh,
    /// Artifacts existed but could not be used; started blank.
    Recovered { reason: String },
}

/// Result of [`SnapshotStore::load`]. Always usable.
#[derive(Debug)]
pub struct LoadedSnapshot {
    pub index: FlatIndex,
    pub mapping: IdMapping,
    pub generation: u64,
    pub origin: SnapshotOrigin,
}

impl LoadedSnapshot {
    fn empty(dimension: usize, origin: SnapshotOrigin) -> Self {
        Self {
            index: FlatIndex::new(dimension),
            mapping: IdMapping::new(),
            generation: 0,
            origin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MappingFile {
    version: u32,
    dimension: usize,
    generation: u64,
    entries: Vec<MappingEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MappingEntry {
    position: usize,
    key: DocumentKey,
}

/// Reads and writes the snapshot artifact pair.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    index_path: PathBuf,
    mapping_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl AsRef<Path>, index_file: &str, mapping_file: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            index_path: dir.join(index_file),
            mapping_path: dir.join(mapping_file),
        }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        Self::new(&config.dir, &config.index_file, &config.mapping_file)
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn mapping_path(&self) -> &Path {
        &self.mapping_path
    }

    /// Write both artifacts atomically (per file) under `generation`.
    pub async fn save(
        &self,
        index: &FlatIndex,
        mapping: &IdMapping,
        generation: u64,
    ) -> Result<(), PersistenceError> {
        let index_bytes = encode_index(index, generation);
        let mapping_bytes = encode_mapping(mapping, index.dimension(), generation)?;

        write_atomic(&self.index_path, &index_bytes).await?;
        write_atomic(&self.mapping_path, &mapping_bytes).await?;

        tracing::debug!(
            vectors = index.len(),
            mappings = mapping.len(),
            generation,
            path = %self.index_path.display(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Load the snapshot, or start blank.
    ///
    /// Missing artifacts yield an empty index; unreadable, corrupt or
    /// differently-dimensioned artifacts are logged and also yield an empty
    /// index. This never fails.
    pub async fn load(&self, dimension: usize) -> LoadedSnapshot {
        let index_exists = path_exists(&self.index_path).await;
        let mapping_exists = path_exists(&self.mapping_path).await;

        if !index_exists || !mapping_exists {
            if index_exists || mapping_exists {
                tracing::warn!(
                    index = %self.index_path.display(),
                    mapping = %self.mapping_path.display(),
                    index_exists,
                    mapping_exists,
                    "incomplete snapshot on disk, starting with an empty index"
                );
                return LoadedSnapshot::empty(
                    dimension,
                    SnapshotOrigin::Recovered {
                        reason: "only one snapshot artifact present".to_string(),
                    },
                );
            }
            tracing::info!("no snapshot found, starting with an empty index");
            return LoadedSnapshot::empty(dimension, SnapshotOrigin::Fresh);
        }

        match self.try_load(dimension).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load snapshot, starting with an empty index");
                LoadedSnapshot::empty(dimension, SnapshotOrigin::Recovered { reason: e.to_string() })
            }
        }
    }

    async fn try_load(&self, dimension: usize) -> Result<LoadedSnapshot, PersistenceError> {
        let index_bytes = fs::read(&self.index_path)
            .await
            .map_err(|source| PersistenceError::Read {
                path: self.index_path.clone(),
                source,
            })?;
        let (index, index_generation) = decode_index(&index_bytes, dimension).map_err(|e| match e {
            DecodeError::Dimension(found) => PersistenceError::DimensionMismatch { expected: dimension, found },
            DecodeError::Corrupt(reason) => PersistenceError::Corrupt {
                path: self.index_path.clone(),
                reason,
            },
        })?;

        let mapping_bytes = fs::read(&self.mapping_path)
            .await
            .map_err(|source| PersistenceError::Read {
                path: self.mapping_path.clone(),
                source,
            })?;
        let file: MappingFile =
            serde_json::from_slice(&mapping_bytes).map_err(|e| PersistenceError::Corrupt {
                path: self.mapping_path.clone(),
                reason: e.to_string(),
            })?;
        if file.dimension != dimension {
            return Err(PersistenceError::DimensionMismatch {
                expected: dimension,
                found: file.dimension,
            });
        }

        if file.generation != index_generation {
            tracing::warn!(
                index_generation,
                mapping_generation = file.generation,
                "snapshot artifacts are from different saves"
            );
        }

        let mapping: IdMapping = file.entries.into_iter().map(|e| (e.position, e.key)).collect();
        let unmapped = mapping.unmapped_positions(index.len());
        if !unmapped.is_empty() {
            tracing::warn!(
                count = unmapped.len(),
                first = unmapped[0],
                "index positions without a mapping entry"
            );
        }

        tracing::info!(
            vectors = index.len(),
            mappings = mapping.len(),
            generation = index_generation,
            "loaded snapshot from disk"
        );

        Ok(LoadedSnapshot {
            index,
            mapping,
            generation: index_generation.max(file.generation),
            origin: SnapshotOrigin::Disk,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum DecodeError {
    Dimension(usize),
    Corrupt(String),
}

fn encode_index(index: &FlatIndex, generation: u64) -> Vec<u8> {
    let data = index.as_slice();
    let mut bytes = Vec::with_capacity(HEADER_LEN + data.len() * 4);
    bytes.extend_from_slice(INDEX_MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(index.dimension() as u32).to_le_bytes());
    bytes.extend_from_slice(&generation.to_le_bytes());
    bytes.extend_from_slice(&(index.len() as u64).to_le_bytes());
    bytes.extend(data.iter().flat_map(|f| f.to_le_bytes()));
    bytes
}

fn decode_index(bytes: &[u8], expected_dimension: usize) -> Result<(FlatIndex, u64), DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::Corrupt(format!("file too short ({} bytes)", bytes.len())));
    }
    if &bytes[0..8] != INDEX_MAGIC {
        return Err(DecodeError::Corrupt("bad magic".to_string()));
    }

    let version = u32::from_le_bytes(read_array(&bytes[8..12]));
    if version != FORMAT_VERSION {
        return Err(DecodeError::Corrupt(format!("unsupported format version {version}")));
    }
    let dimension = u32::from_le_bytes(read_array(&bytes[12..16])) as usize;
    if dimension != expected_dimension {
        return Err(DecodeError::Dimension(dimension));
    }
    let generation = u64::from_le_bytes(read_array(&bytes[16..24]));
    let count = u64::from_le_bytes(read_array(&bytes[24..32])) as usize;

    let body = &bytes[HEADER_LEN..];
    let expected_len = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| DecodeError::Corrupt("vector count overflows".to_string()))?;
    if body.len() != expected_len {
        return Err(DecodeError::Corrupt(format!(
            "expected {expected_len} bytes of vector data, found {}",
            body.len()
        )));
    }

    let data: Vec<f32> = body
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    let index = FlatIndex::from_raw(dimension, data).map_err(|e| DecodeError::Corrupt(e.to_string()))?;
    Ok((index, generation))
}

fn read_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

fn encode_mapping(mapping: &IdMapping, dimension: usize, generation: u64) -> Result<Vec<u8>, serde_json::Error> {
    let file = MappingFile {
        version: FORMAT_VERSION,
        dimension,
        generation,
        entries: mapping
            .iter()
            .map(|(position, key)| MappingEntry {
                position,
                key: key.clone(),
            })
            .collect(),
    };
    serde_json::to_vec_pretty(&file)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let write_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    let temp_path = temp_path_for(path);
    let mut file = fs::File::create(&temp_path).await.map_err(write_err)?;
    file.write_all(bytes).await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, path).await.map_err(write_err)?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn path_exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(s: &str) -> DocumentKey {
        DocumentKey::parse(s).unwrap()
    }

    fn sample(dimension: usize, n: usize) -> (FlatIndex, IdMapping) {
        let mut index = FlatIndex::new(dimension);
        let mut mapping = IdMapping::new();
        for i in 0..n {
            let vector: Vec<f32> = (0..dimension).map(|d| (i * dimension + d) as f32 * 0.5).collect();
            let position = index.append(&vector).unwrap();
            mapping.put(position, key(&format!("doc-{i}")));
        }
        (index, mapping)
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), "index.bin", "mapping.json");
        let (index, mapping) = sample(4, 3);

        store.save(&index, &mapping, 7).await.unwrap();
        let loaded = store.load(4).await;

        assert_eq!(loaded.origin, SnapshotOrigin::Disk);
        assert_eq!(loaded.generation, 7);
        assert_eq!(loaded.index, index);
        assert_eq!(loaded.index.dimension(), 4);
        assert_eq!(loaded.mapping, mapping);
    }

    #[tokio::test]
    async fn test_load_missing_is_fresh() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested"), "index.bin", "mapping.json");
        let loaded = store.load(16).await;
        assert_eq!(loaded.origin, SnapshotOrigin::Fresh);
        assert!(loaded.index.is_empty());
        assert_eq!(loaded.index.dimension(), 16);
        assert!(loaded.mapping.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_index_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), "index.bin", "mapping.json");
        let (index, mapping) = sample(4, 2);
        store.save(&index, &mapping, 1).await.unwrap();

        std::fs::write(store.index_path(), b"not an index").unwrap();
        let loaded = store.load(4).await;

        assert!(matches!(loaded.origin, SnapshotOrigin::Recovered { .. }));
        assert!(loaded.index.is_empty());
        assert!(loaded.mapping.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_mapping_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), "index.bin", "mapping.json");
        let (index, mapping) = sample(4, 2);
        store.save(&index, &mapping, 1).await.unwrap();

        std::fs::write(store.mapping_path(), b"{ truncated").unwrap();
        let loaded = store.load(4).await;

        assert!(matches!(loaded.origin, SnapshotOrigin::Recovered { .. }));
        assert!(loaded.index.is_empty());
    }

    #[tokio::test]
    async fn test_load_dimension_mismatch_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), "index.bin", "mapping.json");
        let (index, mapping) = sample(4, 2);
        store.save(&index, &mapping, 1).await.unwrap();

        let loaded = store.load(8).await;
        assert!(matches!(loaded.origin, SnapshotOrigin::Recovered { .. }));
        assert_eq!(loaded.index.dimension(), 8);
        assert!(loaded.index.is_empty());
    }

    #[tokio::test]
    async fn test_single_artifact_is_recovered_blank() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), "index.bin", "mapping.json");
        let (index, mapping) = sample(4, 2);
        store.save(&index, &mapping, 1).await.unwrap();
        std::fs::remove_file(store.mapping_path()).unwrap();

        let loaded = store.load(4).await;
        assert!(matches!(loaded.origin, SnapshotOrigin::Recovered { .. }));
        assert!(loaded.index.is_empty());
    }

    #[tokio::test]
    async fn test_generation_mismatch_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), "index.bin", "mapping.json");
        let (index, mapping) = sample(2, 1);
        store.save(&index, &mapping, 1).await.unwrap();

        // Simulate a crash between the index and mapping renames.
        let (newer_index, _) = sample(2, 2);
        std::fs::write(store.index_path(), encode_index(&newer_index, 2)).unwrap();

        let loaded = store.load(2).await;
        assert_eq!(loaded.origin, SnapshotOrigin::Disk);
        assert_eq!(loaded.index.len(), 2);
        assert_eq!(loaded.mapping.len(), 1);
        assert_eq!(loaded.generation, 2);
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), "index.bin", "mapping.json");
        let (index, mapping) = sample(3, 2);
        store.save(&index, &mapping, 1).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{names:?}");
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_decode_rejects_truncated_body() {
        let (index, _) = sample(4, 2);
        let mut bytes = encode_index(&index, 1);
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(decode_index(&bytes, 4), Err(DecodeError::Corrupt(_))));
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let path = Path::new("/data/index/index.bin");
        assert_eq!(temp_path_for(path), PathBuf::from("/data/index/index.bin.tmp"));
    }
}
