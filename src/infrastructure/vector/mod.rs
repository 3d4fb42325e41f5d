//! Vector infrastructure components
//!
//! Provides the flat similarity index, the position-to-key mapping, and the
//! snapshot persistence that stores both as one unit.

pub mod flat_index;
pub mod id_mapping;
pub mod snapshot;

pub use flat_index::{squared_l2, FlatIndex, Neighbor};
pub use id_mapping::IdMapping;
pub use snapshot::{LoadedSnapshot, PersistenceError, SnapshotOrigin, SnapshotStore};
