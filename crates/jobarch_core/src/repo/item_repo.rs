//! Job architecture item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for the root/family/cluster/role/level tree.
//! - Enforce the layer adjacency rule before any write.
//! - Keep SQL details, child counting and ordering inside the repository.
//!
//! # Invariants
//! - Every operation runs in one SQLite transaction.
//! - Id lists are bound in batches of `ID_BATCH_SIZE`, so result size never
//!   hits the host-parameter limit.
//! - Absent items are values (`None` / empty lists), never errors.
//! - Descendants are removed by the `ON DELETE CASCADE` foreign key; this
//!   module never walks a subtree to delete it.
//! - Child listing is ordered by `created_at ASC`, ties by insertion order.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::id::JobArchitectureItemId;
use crate::model::item::{
    validate_text_fields, ItemValidationError, JobArchitectureItem, JobArchitectureItemCreate,
};
use crate::model::layer::Layer;
use log::info;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Params, Row, Transaction,
    TransactionBehavior,
};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    level,
    parent,
    parent_level,
    title,
    description,
    creator,
    created_at,
    updated_at
FROM job_architecture_items";

const REQUIRED_TABLES: [&str; 2] = ["job_architecture_items", "job_architecture_levels"];

/// Ids bound per `IN (...)` statement. Stays below SQLite's host-parameter
/// limit on every build (999 before 3.32).
const ID_BATCH_SIZE: usize = 500;

/// Result type used by job architecture repository operations.
pub type JobArchitectureRepoResult<T> = Result<T, JobArchitectureRepoError>;

/// Errors from job architecture repository operations.
#[derive(Debug)]
pub enum JobArchitectureRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// The requested layer may not be created under the given parent.
    WrongLayer(Layer),
    /// Title or description violates storage limits.
    Validation(ItemValidationError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for JobArchitectureRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::WrongLayer(layer) => {
                write!(f, "job architecture item {layer} is not allowed here")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "job architecture repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "job architecture repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid job architecture data: {message}"),
        }
    }
}

impl Error for JobArchitectureRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for JobArchitectureRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ItemValidationError> for JobArchitectureRepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for JobArchitectureRepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::FromSqlConversionFailure(index, _, err) => {
                Self::InvalidData(format!("column {index}: {err}"))
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// Repository interface for the job architecture tree.
pub trait JobArchitectureRepository {
    /// Lists all items without a parent.
    fn get_roots(&self) -> JobArchitectureRepoResult<Vec<JobArchitectureItem>>;
    /// Lists direct children of one item, oldest first.
    fn get_children(
        &self,
        parent_id: JobArchitectureItemId,
    ) -> JobArchitectureRepoResult<Vec<JobArchitectureItem>>;
    /// Loads one item by id.
    fn get_one(
        &self,
        id: JobArchitectureItemId,
    ) -> JobArchitectureRepoResult<Option<JobArchitectureItem>>;
    /// Loads many items, keeping request order and dropping unknown ids.
    fn get_many(
        &self,
        ids: &[JobArchitectureItemId],
    ) -> JobArchitectureRepoResult<Vec<JobArchitectureItem>>;
    /// Creates one item under an optional parent and returns its new id.
    fn create(
        &self,
        parent_id: Option<JobArchitectureItemId>,
        request: &JobArchitectureItemCreate,
    ) -> JobArchitectureRepoResult<JobArchitectureItemId>;
    /// Overwrites title and description. Missing ids are ignored.
    fn update(
        &self,
        id: JobArchitectureItemId,
        title: &str,
        description: Option<&str>,
    ) -> JobArchitectureRepoResult<()>;
    /// Bumps `updated_at` to now. Missing ids are ignored.
    fn mark_updated(&self, id: JobArchitectureItemId) -> JobArchitectureRepoResult<()>;
    /// Deletes items (and, through cascade, their subtrees).
    ///
    /// Returns whether at least one requested id was removed directly.
    fn delete(&self, ids: &[JobArchitectureItemId]) -> JobArchitectureRepoResult<bool>;
}

/// SQLite-backed job architecture repository.
pub struct SqliteJobArchitectureRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJobArchitectureRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> JobArchitectureRepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn read_tx(&self) -> JobArchitectureRepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Deferred,
        )?)
    }

    fn write_tx(&self) -> JobArchitectureRepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl JobArchitectureRepository for SqliteJobArchitectureRepository<'_> {
    fn get_roots(&self) -> JobArchitectureRepoResult<Vec<JobArchitectureItem>> {
        let tx = self.read_tx()?;
        let items = query_items(
            &tx,
            &format!(
                "{ITEM_SELECT_SQL}
                 WHERE parent IS NULL
                 ORDER BY created_at ASC, rowid ASC;"
            ),
            [],
        )?;
        tx.commit()?;
        Ok(items)
    }

    fn get_children(
        &self,
        parent_id: JobArchitectureItemId,
    ) -> JobArchitectureRepoResult<Vec<JobArchitectureItem>> {
        let tx = self.read_tx()?;
        let items = query_items(
            &tx,
            &format!(
                "{ITEM_SELECT_SQL}
                 WHERE parent = ?1
                 ORDER BY created_at ASC, rowid ASC;"
            ),
            [parent_id],
        )?;
        tx.commit()?;
        Ok(items)
    }

    fn get_one(
        &self,
        id: JobArchitectureItemId,
    ) -> JobArchitectureRepoResult<Option<JobArchitectureItem>> {
        let tx = self.read_tx()?;
        let items = query_items(&tx, &format!("{ITEM_SELECT_SQL} WHERE id = ?1;"), [id])?;
        tx.commit()?;
        Ok(items.into_iter().next())
    }

    fn get_many(
        &self,
        ids: &[JobArchitectureItemId],
    ) -> JobArchitectureRepoResult<Vec<JobArchitectureItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let tx = self.read_tx()?;
        let mut by_id = HashMap::with_capacity(ids.len());
        for batch in ids.chunks(ID_BATCH_SIZE) {
            let found = query_items(
                &tx,
                &format!(
                    "{ITEM_SELECT_SQL} WHERE id IN ({});",
                    placeholders(batch.len())
                ),
                params_from_iter(batch.iter()),
            )?;
            by_id.extend(found.into_iter().map(|item| (item.id, item)));
        }
        tx.commit()?;

        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }

    fn create(
        &self,
        parent_id: Option<JobArchitectureItemId>,
        request: &JobArchitectureItemCreate,
    ) -> JobArchitectureRepoResult<JobArchitectureItemId> {
        request.validate()?;

        let tx = self.write_tx()?;
        let parent_layer = match parent_id {
            Some(parent_id) => load_layer(&tx, parent_id)?,
            None => None,
        };
        verify_parent_layer(&tx, request.layer, parent_id, parent_layer)?;

        let id = JobArchitectureItemId::new_v4();
        let now = now_epoch_ms();
        tx.execute(
            "INSERT INTO job_architecture_items (
                id,
                level,
                parent,
                parent_level,
                title,
                description,
                creator,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                id,
                layer_to_db(request.layer),
                parent_id,
                parent_layer.map(layer_to_db),
                request.title.as_str(),
                request.description.as_deref(),
                request.creator,
                now,
                now,
            ],
        )?;
        tx.commit()?;

        info!(
            "event=item_create module=repo status=ok layer={} parent_layer={}",
            request.layer,
            parent_layer.map_or("none", Layer::as_str)
        );
        Ok(id)
    }

    fn update(
        &self,
        id: JobArchitectureItemId,
        title: &str,
        description: Option<&str>,
    ) -> JobArchitectureRepoResult<()> {
        validate_text_fields(title, description)?;

        let tx = self.write_tx()?;
        tx.execute(
            "UPDATE job_architecture_items
             SET title = ?2,
                 description = ?3
             WHERE id = ?1;",
            params![id, title, description],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn mark_updated(&self, id: JobArchitectureItemId) -> JobArchitectureRepoResult<()> {
        let tx = self.write_tx()?;
        tx.execute(
            "UPDATE job_architecture_items
             SET updated_at = ?2
             WHERE id = ?1;",
            params![id, now_epoch_ms()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, ids: &[JobArchitectureItemId]) -> JobArchitectureRepoResult<bool> {
        if ids.is_empty() {
            return Ok(false);
        }

        let tx = self.write_tx()?;
        // `changes()` excludes rows removed by the cascade.
        let mut removed = 0;
        for batch in ids.chunks(ID_BATCH_SIZE) {
            removed += tx.execute(
                &format!(
                    "DELETE FROM job_architecture_items WHERE id IN ({});",
                    placeholders(batch.len())
                ),
                params_from_iter(batch.iter()),
            )?;
        }
        tx.commit()?;

        info!(
            "event=item_delete module=repo status=ok requested={} removed={}",
            ids.len(),
            removed
        );
        Ok(removed > 0)
    }
}

fn query_items<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> JobArchitectureRepoResult<Vec<JobArchitectureItem>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_item_row(row)?);
    }

    if items.is_empty() {
        return Ok(items);
    }

    let ids: Vec<_> = items.iter().map(|item| item.id).collect();
    let counts = count_children(conn, &ids)?;
    for item in &mut items {
        item.child_count = counts.get(&item.id).copied().unwrap_or(0);
    }
    Ok(items)
}

/// One grouped query per id batch instead of one per item.
fn count_children(
    conn: &Connection,
    ids: &[JobArchitectureItemId],
) -> JobArchitectureRepoResult<HashMap<JobArchitectureItemId, u32>> {
    let mut counts = HashMap::new();
    for batch in ids.chunks(ID_BATCH_SIZE) {
        let mut stmt = conn.prepare(&format!(
            "SELECT parent, COUNT(id)
             FROM job_architecture_items
             WHERE parent IN ({})
             GROUP BY parent;",
            placeholders(batch.len())
        ))?;
        let mut rows = stmt.query(params_from_iter(batch.iter()))?;
        while let Some(row) = rows.next()? {
            let parent: JobArchitectureItemId = row.get(0)?;
            let count: u32 = row.get(1)?;
            counts.insert(parent, count);
        }
    }
    Ok(counts)
}

fn load_layer(
    conn: &Connection,
    id: JobArchitectureItemId,
) -> JobArchitectureRepoResult<Option<Layer>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT level FROM job_architecture_items WHERE id = ?1;",
            [id],
            |row| row.get(0),
        )
        .optional()?;
    value
        .map(|text| parse_layer(&text, "job_architecture_items.level"))
        .transpose()
}

fn verify_parent_layer(
    conn: &Connection,
    layer: Layer,
    parent_id: Option<JobArchitectureItemId>,
    parent_layer: Option<Layer>,
) -> JobArchitectureRepoResult<()> {
    // A root may not point at anything, even an id that does not resolve.
    if layer == Layer::Root && parent_id.is_some() {
        return Err(JobArchitectureRepoError::WrongLayer(layer));
    }

    let allowed: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM job_architecture_levels
            WHERE id = ?1
              AND parent IS ?2
        );",
        params![layer_to_db(layer), parent_layer.map(layer_to_db)],
        |row| row.get(0),
    )?;
    if allowed != 1 {
        return Err(JobArchitectureRepoError::WrongLayer(layer));
    }
    Ok(())
}

fn parse_item_row(row: &Row<'_>) -> JobArchitectureRepoResult<JobArchitectureItem> {
    let layer_text: String = row.get("level")?;
    let layer = parse_layer(&layer_text, "job_architecture_items.level")?;
    let parent_layer = row
        .get::<_, Option<String>>("parent_level")?
        .map(|value| parse_layer(&value, "job_architecture_items.parent_level"))
        .transpose()?;

    Ok(JobArchitectureItem {
        id: row.get("id")?,
        layer,
        parent_id: row.get("parent")?,
        parent_layer,
        title: row.get("title")?,
        description: row.get("description")?,
        child_count: 0,
        creator: row.get("creator")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Storage tag of a layer. Matches the seeded `job_architecture_levels.id`.
fn layer_to_db(layer: Layer) -> &'static str {
    match layer {
        Layer::Root => "ROOT",
        Layer::Family => "FAMILY",
        Layer::Cluster => "CLUSTER",
        Layer::Role => "ROLE",
        Layer::Level => "LEVEL",
    }
}

fn parse_layer(value: &str, column: &'static str) -> JobArchitectureRepoResult<Layer> {
    match value {
        "ROOT" => Ok(Layer::Root),
        "FAMILY" => Ok(Layer::Family),
        "CLUSTER" => Ok(Layer::Cluster),
        "ROLE" => Ok(Layer::Role),
        "LEVEL" => Ok(Layer::Level),
        other => Err(JobArchitectureRepoError::InvalidData(format!(
            "invalid layer `{other}` in {column}"
        ))),
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}

fn ensure_connection_ready(conn: &Connection) -> JobArchitectureRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(JobArchitectureRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(JobArchitectureRepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
