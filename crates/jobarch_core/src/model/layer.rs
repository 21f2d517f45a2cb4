//! Hierarchy layer kinds and the adjacency rule.
//!
//! # Invariants
//! - Layers are totally ordered: `Root < Family < Cluster < Role < Level`.
//! - Each layer's only valid parent is its immediate predecessor; `Root` has
//!   no parent.
//! - Storage tags never exceed [`LAYER_LIMIT`] bytes.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Maximum length of the storage tag of any layer.
pub const LAYER_LIMIT: usize = 8;

/// One rank of the job architecture taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Root,
    Family,
    Cluster,
    Role,
    Level,
}

impl Layer {
    /// All layers, top to bottom.
    pub const ALL: [Layer; 5] = [
        Layer::Root,
        Layer::Family,
        Layer::Cluster,
        Layer::Role,
        Layer::Level,
    ];

    /// Layer an item of this layer must hang under. `None` for `Root`.
    pub fn allowed_parent(self) -> Option<Layer> {
        match self {
            Self::Root => None,
            Self::Family => Some(Self::Root),
            Self::Cluster => Some(Self::Family),
            Self::Role => Some(Self::Cluster),
            Self::Level => Some(Self::Role),
        }
    }

    /// Returns whether `(self, parent)` is a permitted child/parent pairing.
    pub fn accepts_parent(self, parent: Option<Layer>) -> bool {
        self.allowed_parent() == parent
    }

    /// Lowercase wire tag (`"root"`, `"family"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Family => "family",
            Self::Cluster => "cluster",
            Self::Role => "role",
            Self::Level => "level",
        }
    }
}

impl Display for Layer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when text does not name a known layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLayer(pub String);

impl Display for UnknownLayer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown layer `{}`; expected root|family|cluster|role|level",
            self.0
        )
    }
}

impl Error for UnknownLayer {}

impl FromStr for Layer {
    type Err = UnknownLayer;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Layer::ALL
            .into_iter()
            .find(|layer| layer.as_str() == normalized)
            .ok_or_else(|| UnknownLayer(value.to_string()))
    }
}
