use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rusqlite::Connection;

fn fixture_db(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("game.db");
    let conn = Connection::open(&path).expect("failed to create database");
    conn.execute_batch(
        "CREATE TABLE users (id INT PRIMARY KEY, money INT, name TEXT NOT NULL);
         INSERT INTO users (id, money, name) VALUES (1, 10, 'ann'), (2, 20, 'bob'), (3, 30, 'O''Neil');
         CREATE TABLE guilds (id INT, tag TEXT);",
    )
    .expect("failed to seed database");
    path
}

fn run(args: &[&str], db: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sqlite-driver"))
        .args(args)
        .args(["--db", db.to_str().unwrap()])
        .output()
        .expect("failed to run sqlite-driver")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn tables_lists_user_tables() {
    let dir = tempfile::tempdir().unwrap();
    let db = fixture_db(&dir);
    let output = run(&["tables"], &db);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), ["guilds", "users"]);
}

#[test]
fn columns_shows_physical_layout() {
    let dir = tempfile::tempdir().unwrap();
    let db = fixture_db(&dir);
    let output = run(&["columns", "--table", "users"], &db);
    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        [
            "0\tid\tINT\tPRIMARY KEY",
            "1\tmoney\tINT",
            "2\tname\tTEXT\tNOT NULL",
        ]
    );
}

#[test]
fn count_prints_row_count() {
    let dir = tempfile::tempdir().unwrap();
    let db = fixture_db(&dir);
    let output = run(&["count", "--table", "users"], &db);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), ["3"]);

    let output = run(&["count", "--table", "guilds"], &db);
    assert_eq!(stdout_lines(&output), ["0"]);
}

#[test]
fn dump_prints_json_lines_with_pagination() {
    let dir = tempfile::tempdir().unwrap();
    let db = fixture_db(&dir);
    let output = run(
        &["dump", "--table", "users", "--limit", "2", "--offset", "1"],
        &db,
    );
    assert!(output.status.success());
    let rows: Vec<serde_json::Value> = stdout_lines(&output)
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], 2);
    assert_eq!(rows[1]["name"], "O'Neil");
    assert_eq!(rows[1]["money"], 30);
}

#[test]
fn dump_offset_without_limit() {
    let dir = tempfile::tempdir().unwrap();
    let db = fixture_db(&dir);
    let output = run(&["dump", "--table", "users", "--offset", "2"], &db);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output).len(), 1);
}

#[test]
fn unknown_table_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db = fixture_db(&dir);
    let output = run(&["count", "--table", "missing"], &db);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: Table 'missing' does not exist"));
}

#[test]
fn invalid_table_name_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db = fixture_db(&dir);
    let output = run(&["dump", "--table", "users; DROP TABLE users"], &db);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid table name"));

    let output = run(&["count", "--table", "users"], &db);
    assert_eq!(stdout_lines(&output), ["3"]);
}

#[test]
fn missing_database_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(&["tables"], &dir.path().join("nope.db"));
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}
