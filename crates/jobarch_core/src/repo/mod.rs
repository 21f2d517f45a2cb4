//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes enforce the layer adjacency rule and text limits
//!   before persistence.
//! - Missing rows are reported as `None`/empty results; the service layer
//!   decides when absence is an error.

pub mod item_repo;
