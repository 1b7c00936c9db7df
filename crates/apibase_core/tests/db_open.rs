use apibase_core::config::{CoreConfig, DatabaseConfig};
use apibase_core::db::{open_db, open_db_with_config};

#[test]
fn file_database_is_created_with_foreign_keys_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("apibase.db");

    let conn = open_db(&path).unwrap();
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();

    assert_eq!(foreign_keys, 1);
    assert!(path.exists());
}

#[test]
fn config_without_path_opens_in_memory_with_busy_timeout() {
    let config = DatabaseConfig {
        path: None,
        busy_timeout_ms: 1_500,
    };
    let conn = open_db_with_config(&config).unwrap();

    let timeout: i64 = conn
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 1_500);
    assert!(conn.path().map_or(true, str::is_empty));
}

#[test]
fn config_file_drives_database_location() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("from-config.db");
    let config_path = dir.path().join("apibase.toml");
    std::fs::write(
        &config_path,
        format!(
            "[database]\npath = {:?}\nbusy_timeout_ms = 250\n\n[cache]\nprefix = \"itest\"\n",
            db_path.to_str().unwrap()
        ),
    )
    .unwrap();

    let config = CoreConfig::load(&config_path).unwrap();
    assert_eq!(config.cache.prefix, "itest");

    let conn = open_db_with_config(&config.database).unwrap();
    conn.execute_batch("CREATE TABLE probe (id INTEGER PRIMARY KEY);")
        .unwrap();
    assert!(db_path.exists());
}

#[test]
fn missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CoreConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().starts_with("failed to read config"));
}
