//! Core domain logic for the job architecture hierarchy.
//! This crate is the single source of truth for tree invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::id::{JobArchitectureItemId, UserId};
pub use model::item::{
    ItemValidationError, JobArchitectureItem, JobArchitectureItemCreate, DESCRIPTION_LIMIT,
    TITLE_LIMIT, TITLE_MIN_LENGTH,
};
pub use model::layer::{Layer, UnknownLayer, LAYER_LIMIT};
pub use repo::item_repo::{
    JobArchitectureRepoError, JobArchitectureRepoResult, JobArchitectureRepository,
    SqliteJobArchitectureRepository,
};
pub use service::item_service::{
    JobArchitectureService, JobArchitectureServiceError, JobArchitectureServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
