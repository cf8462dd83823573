#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use sqlite_todo::sqlite3::{Connection, OriginStorage, SqliteDriver};
use tempfile::TempDir;

pub const DB_FILE: &str = "todo.sqlite3";

pub fn storage_in(dir: &TempDir) -> OriginStorage {
    OriginStorage::new(dir.path().join("opfs"))
}

pub async fn open_driver() -> (TempDir, SqliteDriver, Connection) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let driver = SqliteDriver::initialize(storage_in(&dir), DB_FILE)
        .await
        .expect("driver initialize failed");
    let conn = driver.open().await.expect("driver open failed");
    (dir, driver, conn)
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .expect("valid date")
        .and_hms_opt(h, min, 0)
        .expect("valid time")
}
