use dernek_core::db::migrations::latest_version;
use dernek_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "organizations",
        "members",
        "boards",
        "board_terms",
        "board_memberships",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dernek.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "board_memberships");
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
fn schema_rejects_second_active_term_on_same_board() {
    let conn = open_db_in_memory().unwrap();
    let board_id = seed_board(&conn);

    insert_term(&conn, "t1", &board_id, 1_000, true).unwrap();
    insert_term(&conn, "t2", &board_id, 2_000, false).unwrap();

    let err = insert_term(&conn, "t3", &board_id, 3_000, true).unwrap_err();
    assert!(DbError::Sqlite(err).is_unique_violation());
}

#[test]
fn upgrade_keeps_only_newest_active_term_per_board() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_governance.sql"))
        .unwrap();
    conn.execute_batch("PRAGMA user_version = 1;").unwrap();
    let board_id = seed_board(&conn);
    insert_term(&conn, "old", &board_id, 1_000, true).unwrap();
    insert_term(&conn, "new", &board_id, 5_000, true).unwrap();
    insert_term(&conn, "mid", &board_id, 3_000, true).unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());

    let mut stmt = conn
        .prepare("SELECT id FROM board_terms WHERE is_active = 1;")
        .unwrap();
    let active = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(active, vec!["new".to_string()]);
}

#[test]
fn member_title_check_rejects_unknown_value() {
    let conn = open_db_in_memory().unwrap();
    seed_board(&conn);

    let result = conn.execute(
        "INSERT INTO members (id, organization_id, first_name, last_name, title)
         VALUES ('m1', 'org', 'Ayse', 'Kaya', 'KING');",
        [],
    );
    assert!(result.is_err());
}

fn seed_board(conn: &Connection) -> String {
    conn.execute(
        "INSERT INTO organizations (id, name) VALUES ('org', 'Dernek');",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO boards (id, organization_id, board_type) VALUES ('board', 'org', 'EXECUTIVE');",
        [],
    )
    .unwrap();
    "board".to_string()
}

fn insert_term(
    conn: &Connection,
    id: &str,
    board_id: &str,
    start_date: i64,
    is_active: bool,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO board_terms (id, board_id, start_date, is_active) VALUES (?1, ?2, ?3, ?4);",
        params![id, board_id, start_date, i64::from(is_active)],
    )
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
