use super::driver::{Connection, SqliteDriver};
use super::vfs::validate_filename;
use crate::error::StoreError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SQLITE_HEADER: &[u8] = b"SQLite format 3\0";

/// Reads `source` into memory and installs it as the driver's database file.
/// See [`upload_sqlite3_bytes`].
pub async fn upload_sqlite3_data(
    driver: &SqliteDriver,
    current: Option<Connection>,
    source: impl AsRef<Path>,
) -> Result<Connection, StoreError> {
    let source = source.as_ref();
    let bytes = tokio::fs::read(source).await?;
    info!(source = %source.display(), len = bytes.len(), "importing database file");
    upload_sqlite3_bytes(driver, current, &bytes).await
}

/// Overwrites the driver's database file with `bytes` and reopens it.
///
/// The bytes are staged beside the database before `current` is closed, so a
/// failed write leaves `current` open and the file untouched. The returned
/// connection replaces `current`; clients holding the old one must be rebound.
pub async fn upload_sqlite3_bytes(
    driver: &SqliteDriver,
    current: Option<Connection>,
    bytes: &[u8],
) -> Result<Connection, StoreError> {
    if !bytes.is_empty() && !bytes.starts_with(SQLITE_HEADER) {
        return Err(StoreError::InvalidDatabaseFile);
    }
    let staged = driver
        .storage()
        .stage_file(driver.get_db_file(), bytes)
        .await?;
    if let Some(conn) = current {
        match driver.close(conn).await {
            Ok(()) | Err(StoreError::UnknownConnection(_)) => {}
            Err(e) => warn!("DB: {}, close before import failed: {}", conn.id(), e),
        }
    }
    staged.commit().await?;
    driver.open().await
}

/// Exports the database and saves it as `dest_dir/filename`.
pub async fn download_sqlite3_data(
    driver: &SqliteDriver,
    conn: &Connection,
    dest_dir: impl AsRef<Path>,
    filename: &str,
) -> Result<PathBuf, StoreError> {
    validate_filename(filename)?;
    let bytes = driver.export_data(conn).await?;
    let dest_dir = dest_dir.as_ref();
    tokio::fs::create_dir_all(dest_dir).await?;
    let path = dest_dir.join(filename);
    tokio::fs::write(&path, &bytes).await?;
    info!(path = %path.display(), len = bytes.len(), "database exported");
    Ok(path)
}
