//! Job architecture item domain model.
//!
//! # Responsibility
//! - Define the tree node read model and its creation request.
//! - Validate free-text fields before they reach storage.
//!
//! # Invariants
//! - `parent_id` is `None` iff `layer == Layer::Root`.
//! - `parent_layer` mirrors the parent's layer at creation time.
//! - `id`, `layer`, `parent_id` and `parent_layer` never change after creation.
//! - `child_count` is derived at read time and never stored.

use crate::model::id::{JobArchitectureItemId, UserId};
use crate::model::layer::Layer;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum title length. Declared for clients, not enforced by core.
pub const TITLE_MIN_LENGTH: usize = 3;
/// Maximum title length in characters.
pub const TITLE_LIMIT: usize = 256;
/// Maximum description length in characters.
pub const DESCRIPTION_LIMIT: usize = 100_000;

/// One node of the job architecture tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobArchitectureItem {
    pub id: JobArchitectureItemId,
    #[serde(rename = "level")]
    pub layer: Layer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<JobArchitectureItemId>,
    #[serde(rename = "parentLevel", default, skip_serializing_if = "Option::is_none")]
    pub parent_layer: Option<Layer>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Number of direct children at read time.
    pub child_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserId>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl JobArchitectureItem {
    /// Returns whether this item is a tree root.
    pub fn is_root(&self) -> bool {
        self.layer == Layer::Root
    }
}

/// Request to create one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobArchitectureItemCreate {
    #[serde(rename = "level")]
    pub layer: Layer,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserId>,
}

impl JobArchitectureItemCreate {
    /// Builds a request with no description and no creator.
    pub fn new(layer: Layer, title: impl Into<String>) -> Self {
        Self {
            layer,
            title: title.into(),
            description: None,
            creator: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the creator.
    pub fn with_creator(mut self, creator: UserId) -> Self {
        self.creator = Some(creator);
        self
    }

    /// Validates text fields against storage limits.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        validate_text_fields(&self.title, self.description.as_deref())
    }
}

/// Validation errors for item text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    /// Title is empty after trim.
    BlankTitle,
    /// Title exceeds [`TITLE_LIMIT`] characters.
    TitleTooLong { length: usize },
    /// Description exceeds [`DESCRIPTION_LIMIT`] characters.
    DescriptionTooLong { length: usize },
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::TitleTooLong { length } => {
                write!(f, "title has {length} characters, limit is {TITLE_LIMIT}")
            }
            Self::DescriptionTooLong { length } => write!(
                f,
                "description has {length} characters, limit is {DESCRIPTION_LIMIT}"
            ),
        }
    }
}

impl Error for ItemValidationError {}

/// Checks a title/description pair for create and update paths.
pub fn validate_text_fields(
    title: &str,
    description: Option<&str>,
) -> Result<(), ItemValidationError> {
    if title.trim().is_empty() {
        return Err(ItemValidationError::BlankTitle);
    }
    let title_length = title.chars().count();
    if title_length > TITLE_LIMIT {
        return Err(ItemValidationError::TitleTooLong {
            length: title_length,
        });
    }
    if let Some(description) = description {
        let length = description.chars().count();
        if length > DESCRIPTION_LIMIT {
            return Err(ItemValidationError::DescriptionTooLong { length });
        }
    }
    Ok(())
}
