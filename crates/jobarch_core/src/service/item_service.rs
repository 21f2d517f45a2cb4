//! Job architecture use-case service.
//!
//! # Responsibility
//! - Translate repository "absent" results into caller-facing errors.
//! - Own the root propagation policy: every create, update or delete inside a
//!   tree bumps `updated_at` on that tree's root.
//!
//! # Invariants
//! - Root lookup is iterative and bounded by the number of layers.
//! - Root propagation never fails an already-applied mutation because an
//!   ancestor has vanished; it logs and skips instead. A missing target item
//!   is always reported as `ItemNotFound`.

use crate::model::id::JobArchitectureItemId;
use crate::model::item::{ItemValidationError, JobArchitectureItem, JobArchitectureItemCreate};
use crate::model::layer::Layer;
use crate::repo::item_repo::{JobArchitectureRepoError, JobArchitectureRepository};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum number of items on any path from a node up to its root.
const MAX_HIERARCHY_DEPTH: usize = Layer::ALL.len();

/// Errors from job architecture service operations.
#[derive(Debug)]
pub enum JobArchitectureServiceError {
    /// Requested item does not exist.
    ItemNotFound(JobArchitectureItemId),
    /// The requested layer may not be created under the given parent.
    WrongLayer(Layer),
    /// Title or description violates storage limits.
    Validation(ItemValidationError),
    /// An item's parent reference does not resolve.
    OrphanedAncestor {
        item_id: JobArchitectureItemId,
        parent_id: JobArchitectureItemId,
    },
    /// Walking up from the item did not reach a root within the layer count.
    HierarchyTooDeep(JobArchitectureItemId),
    /// Repository-level failure.
    Repo(JobArchitectureRepoError),
}

impl Display for JobArchitectureServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound(id) => write!(f, "job architecture item {id} not found"),
            Self::WrongLayer(layer) => {
                write!(f, "job architecture item {layer} is not allowed here")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::OrphanedAncestor { item_id, parent_id } => write!(
                f,
                "job architecture item {item_id} references missing parent {parent_id}"
            ),
            Self::HierarchyTooDeep(id) => write!(
                f,
                "no root found within {MAX_HIERARCHY_DEPTH} levels above job architecture item {id}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for JobArchitectureServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<JobArchitectureRepoError> for JobArchitectureServiceError {
    fn from(value: JobArchitectureRepoError) -> Self {
        match value {
            JobArchitectureRepoError::WrongLayer(layer) => Self::WrongLayer(layer),
            JobArchitectureRepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type JobArchitectureServiceResult<T> = Result<T, JobArchitectureServiceError>;

/// Job architecture service facade.
pub struct JobArchitectureService<R: JobArchitectureRepository> {
    repo: R,
}

impl<R: JobArchitectureRepository> JobArchitectureService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists all tree roots.
    pub fn get_roots(&self) -> JobArchitectureServiceResult<Vec<JobArchitectureItem>> {
        Ok(self.repo.get_roots()?)
    }

    /// Lists direct children of one item, oldest first.
    pub fn get_children(
        &self,
        parent_id: JobArchitectureItemId,
    ) -> JobArchitectureServiceResult<Vec<JobArchitectureItem>> {
        Ok(self.repo.get_children(parent_id)?)
    }

    /// Loads one item or fails with [`JobArchitectureServiceError::ItemNotFound`].
    pub fn get_one(
        &self,
        id: JobArchitectureItemId,
    ) -> JobArchitectureServiceResult<JobArchitectureItem> {
        self.repo
            .get_one(id)?
            .ok_or(JobArchitectureServiceError::ItemNotFound(id))
    }

    /// Loads many items in request order; unknown ids are dropped.
    pub fn get_many(
        &self,
        ids: &[JobArchitectureItemId],
    ) -> JobArchitectureServiceResult<Vec<JobArchitectureItem>> {
        Ok(self.repo.get_many(ids)?)
    }

    /// Creates one item and touches its tree root.
    pub fn create(
        &self,
        parent_id: Option<JobArchitectureItemId>,
        request: &JobArchitectureItemCreate,
    ) -> JobArchitectureServiceResult<JobArchitectureItemId> {
        let created = self.repo.create(parent_id, request)?;
        self.propagate_root_timestamp(created)?;
        Ok(created)
    }

    /// Rewrites title/description, bumps the item and its tree root.
    ///
    /// Fails with [`JobArchitectureServiceError::ItemNotFound`] before any
    /// write when `id` does not exist.
    pub fn update(
        &self,
        id: JobArchitectureItemId,
        title: &str,
        description: Option<&str>,
    ) -> JobArchitectureServiceResult<()> {
        self.get_one(id)?;
        self.repo.update(id, title, description)?;
        self.repo.mark_updated(id)?;
        self.propagate_root_timestamp(id)
    }

    /// Deletes the given items that belong to `layer`, then touches the roots
    /// of the trees they were removed from.
    ///
    /// Ids of other layers are ignored. Returns whether anything was removed.
    pub fn delete_many(
        &self,
        ids: &[JobArchitectureItemId],
        layer: Layer,
    ) -> JobArchitectureServiceResult<bool> {
        let to_delete: Vec<_> = self
            .repo
            .get_many(ids)?
            .into_iter()
            .filter(|item| item.layer == layer)
            .collect();
        if to_delete.is_empty() {
            debug!(
                "event=item_delete module=service status=skip layer={} requested={}",
                layer,
                ids.len()
            );
            return Ok(false);
        }

        let delete_ids: Vec<_> = to_delete.iter().map(|item| item.id).collect();
        let removed = self.repo.delete(&delete_ids)?;

        // The deleted items are gone; walk up from the parents they had.
        for item in &to_delete {
            if let Some(parent_id) = item.parent_id {
                self.propagate_root_timestamp(parent_id)?;
            }
        }
        Ok(removed)
    }

    /// Walks parent links up to the root of the item's tree.
    ///
    /// Returns `None` when the walk ends at a parentless item that is not a
    /// root layer.
    pub fn get_root(
        &self,
        id: JobArchitectureItemId,
    ) -> JobArchitectureServiceResult<Option<JobArchitectureItem>> {
        let mut current = self.get_one(id)?;
        for _ in 0..MAX_HIERARCHY_DEPTH {
            if current.is_root() {
                return Ok(Some(current));
            }
            let Some(parent_id) = current.parent_id else {
                return Ok(None);
            };
            current = self.repo.get_one(parent_id)?.ok_or(
                JobArchitectureServiceError::OrphanedAncestor {
                    item_id: current.id,
                    parent_id,
                },
            )?;
        }
        Err(JobArchitectureServiceError::HierarchyTooDeep(id))
    }

    /// Marks the root of the item's tree as updated.
    ///
    /// Fails with [`JobArchitectureServiceError::ItemNotFound`] when `id` is
    /// missing. A broken ancestor chain is skipped with a warning.
    pub fn propagate_root_timestamp(
        &self,
        id: JobArchitectureItemId,
    ) -> JobArchitectureServiceResult<()> {
        match self.get_root(id) {
            Ok(Some(root)) => {
                self.repo.mark_updated(root.id)?;
                Ok(())
            }
            Ok(None) => {
                warn!("event=root_propagate module=service status=skip reason=no_root item={id}");
                Ok(())
            }
            Err(
                err @ (JobArchitectureServiceError::OrphanedAncestor { .. }
                | JobArchitectureServiceError::HierarchyTooDeep(_)),
            ) => {
                warn!(
                    "event=root_propagate module=service status=skip reason=unresolved item={id} error={err}"
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
