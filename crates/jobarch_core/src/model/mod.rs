//! Job architecture domain model.
//!
//! # Responsibility
//! - Define typed identifiers, hierarchy layers and the tree node record.
//! - Keep wire naming (serde) next to the types it describes.
//!
//! # Invariants
//! - Every item is identified by a stable `JobArchitectureItemId`.
//! - Deletion is hard and cascades to descendants; there are no tombstones.

pub mod id;
pub mod item;
pub mod layer;
