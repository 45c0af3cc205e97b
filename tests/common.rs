#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use dbhelper::{DEFAULT_CONNECTION_NAME, Session};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn dbh() -> Command {
    cargo_bin_cmd!("dbhelper")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_dbhelper.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    fs::remove_file(format!("{db_path}-journal")).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// Connection-string source with the default name pointing at `db_path`
pub fn connection_strings(db_path: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert(
        DEFAULT_CONNECTION_NAME.to_string(),
        format!("Data Source={db_path}"),
    );
    map
}

/// Fresh session on a fresh temp database
pub fn session_for(name: &str) -> Session {
    let db_path = setup_test_db(name);
    Session::new(&connection_strings(&db_path)).expect("create session")
}

/// Session with a small `people` table already filled
pub fn session_with_people(name: &str) -> Session {
    let mut session = session_for(name);
    session
        .execute_non_query(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER)",
        )
        .expect("create table");
    session
        .execute_non_query(
            "INSERT INTO people (name, age) VALUES ('Ada', 36), ('Linus', 28), ('Grace', NULL)",
        )
        .expect("insert rows");
    session
}
