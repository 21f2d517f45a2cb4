use jobarch_core::db::migrations::{apply_migrations, latest_version};
use jobarch_core::db::{open_db, open_db_in_memory, DbError};
use jobarch_core::{JobArchitectureRepoError, Layer, SqliteJobArchitectureRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "job_architecture_items");
    assert_table_exists(&conn, "job_architecture_levels");
}

#[test]
fn foreign_keys_are_enabled() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn levels_table_matches_static_adjacency_rule() {
    let conn = open_db_in_memory().unwrap();

    let mut stmt = conn
        .prepare("SELECT id, parent FROM job_architecture_levels ORDER BY id;")
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut pairs = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let id: String = row.get(0).unwrap();
        let parent: Option<String> = row.get(1).unwrap();
        pairs.push((id, parent));
    }

    let mut expected: Vec<_> = Layer::ALL
        .into_iter()
        .map(|layer| {
            (
                layer.as_str().to_ascii_uppercase(),
                layer
                    .allowed_parent()
                    .map(|parent| parent.as_str().to_ascii_uppercase()),
            )
        })
        .collect();
    expected.sort();

    assert_eq!(pairs, expected);
}

#[test]
fn items_table_has_contract_columns() {
    let conn = open_db_in_memory().unwrap();

    let mut stmt = conn
        .prepare("PRAGMA table_info(job_architecture_items);")
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let column_name: String = row.get(1).unwrap();
        columns.push(column_name);
    }

    for column in [
        "id",
        "level",
        "parent",
        "parent_level",
        "title",
        "description",
        "creator",
        "created_at",
        "updated_at",
    ] {
        assert!(columns.contains(&column.to_string()), "missing {column}");
    }
}

#[test]
fn parent_foreign_key_cascades_on_delete() {
    let conn = open_db_in_memory().unwrap();

    let mut stmt = conn
        .prepare("PRAGMA foreign_key_list(job_architecture_items);")
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut parent_on_delete = None;
    while let Some(row) = rows.next().unwrap() {
        let table: String = row.get("table").unwrap();
        let from: String = row.get("from").unwrap();
        if table == "job_architecture_items" && from == "parent" {
            parent_on_delete = Some(row.get::<_, String>("on_delete").unwrap());
        }
    }

    assert_eq!(parent_on_delete.as_deref(), Some("CASCADE"));
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobarch.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let levels: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM job_architecture_levels;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(levels, Layer::ALL.len() as i64);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failing_migration_names_its_version_and_rolls_back() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE job_architecture_levels (id TEXT PRIMARY KEY);")
        .unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();

    assert!(matches!(err, DbError::Migration { version: 1, .. }));
    assert!(err.to_string().contains("migration 1 failed"));
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(schema_version(&conn), 0);
    let items_tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'job_architecture_items';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(items_tables, 0);
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteJobArchitectureRepository::try_new(&conn)
        .err()
        .expect("unmigrated connection must be rejected");
    assert!(matches!(
        err,
        JobArchitectureRepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
