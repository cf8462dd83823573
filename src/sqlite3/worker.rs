use super::record::Record;
use super::statement::Statement;
use super::value::SqlValue;
use super::vfs::{OPFS_VFS, OriginStorage, VfsUri};
use crate::error::StoreError;

use futures::TryStreamExt;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde::Serialize;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteRow,
};
use sqlx::{Column, ConnectOptions, Connection as _, Either, Executor, Row, Sqlite, TypeInfo, ValueRef};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Identifier the worker hands out for each opened database.
pub type DbId = u64;

/// Requests handled by the sqlite worker, one at a time in mailbox order.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Open (creating if absent) the file named by a `file:...?vfs=opfs` uri.
    Open {
        uri: String,
        reply: RpcReplyPort<Result<DbId, StoreError>>,
    },
    /// Run one statement. Rows go to `rows` if given, otherwise they are dropped.
    Exec {
        db_id: DbId,
        statement: Statement,
        rows: Option<mpsc::UnboundedSender<Record>>,
        reply: RpcReplyPort<Result<ExecSummary, StoreError>>,
    },
    /// Raw bytes of the database file.
    Export {
        db_id: DbId,
        reply: RpcReplyPort<Result<Vec<u8>, StoreError>>,
    },
    Close {
        db_id: DbId,
        reply: RpcReplyPort<Result<(), StoreError>>,
    },
    ConfigGet(RpcReplyPort<Result<WorkerConfig, StoreError>>),
}

/// Outcome of one `Exec`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecSummary {
    pub rows_affected: u64,
    /// Connection-level rowid of the most recent successful INSERT.
    pub last_insert_rowid: i64,
    pub rows_returned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerConfig {
    pub version: String,
    pub vfs_list: Vec<String>,
    pub storage_root: PathBuf,
    pub open_connections: usize,
}

struct OpenDatabase {
    uri: VfsUri,
    path: PathBuf,
    conn: SqliteConnection,
}

struct SqliteWorkerState {
    storage: OriginStorage,
    next_id: DbId,
    databases: HashMap<DbId, OpenDatabase>,
}

impl SqliteWorkerState {
    fn database(&mut self, db_id: DbId) -> Result<&mut OpenDatabase, StoreError> {
        self.databases
            .get_mut(&db_id)
            .ok_or(StoreError::UnknownConnection(db_id))
    }
}

/// ractor-based owner of every open sqlite connection
struct SqliteWorker;

#[ractor::async_trait]
impl Actor for SqliteWorker {
    type Msg = WorkerMessage;
    type State = SqliteWorkerState;
    type Arguments = OriginStorage;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        storage: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        storage.ensure_root().await.map_err(|e| {
            ActorProcessingErr::from(format!(
                "storage root {} unavailable: {}",
                storage.root().display(),
                e
            ))
        })?;
        info!(root = %storage.root().display(), "SqliteWorker ready");
        Ok(SqliteWorkerState {
            storage,
            next_id: 1,
            databases: HashMap::new(),
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMessage::Open { uri, reply } => {
                let _ = reply.send(self.handle_open(state, &uri).await);
            }
            WorkerMessage::Exec {
                db_id,
                statement,
                rows,
                reply,
            } => {
                let result = self.handle_exec(state, db_id, statement, rows).await;
                if let Err(e) = &result {
                    debug!("DB: {db_id}, exec failed: {}", e);
                }
                let _ = reply.send(result);
            }
            WorkerMessage::Export { db_id, reply } => {
                let _ = reply.send(self.handle_export(state, db_id).await);
            }
            WorkerMessage::Close { db_id, reply } => {
                let _ = reply.send(self.handle_close(state, db_id).await);
            }
            WorkerMessage::ConfigGet(reply) => {
                let _ = reply.send(self.handle_config_get(state).await);
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        for (db_id, db) in state.databases.drain() {
            if let Err(e) = db.conn.close().await {
                warn!("DB: {db_id}, close on shutdown failed: {}", e);
            }
        }
        info!("SqliteWorker stopped");
        Ok(())
    }
}

impl SqliteWorker {
    async fn handle_open(
        &self,
        state: &mut SqliteWorkerState,
        uri: &str,
    ) -> Result<DbId, StoreError> {
        let uri = VfsUri::parse(uri)?;
        if uri.vfs() != OPFS_VFS {
            return Err(StoreError::UnsupportedVfs(uri.to_string()));
        }
        let path = state.storage.file_path(uri.filename())?;
        state.storage.ensure_root().await?;

        // DELETE journaling keeps every committed change in the main file,
        // so exporting is a plain read.
        let conn = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .connect()
            .await?;

        let db_id = state.next_id;
        state.next_id += 1;
        info!("DB: {db_id}, opened {uri}");
        state
            .databases
            .insert(db_id, OpenDatabase { uri, path, conn });
        Ok(db_id)
    }

    async fn handle_exec(
        &self,
        state: &mut SqliteWorkerState,
        db_id: DbId,
        statement: Statement,
        rows: Option<mpsc::UnboundedSender<Record>>,
    ) -> Result<ExecSummary, StoreError> {
        let db = state.database(db_id)?;
        let (sql, args) = statement.into_positional()?;

        let query = args
            .into_iter()
            .fold(sqlx::query(&sql), |query, arg| bind_value(query, arg));

        let mut summary = ExecSummary::default();
        let mut stream = (&mut db.conn).fetch_many(query);
        while let Some(step) = stream.try_next().await? {
            match step {
                Either::Left(done) => {
                    summary.rows_affected += done.rows_affected();
                    summary.last_insert_rowid = done.last_insert_rowid();
                }
                Either::Right(row) => {
                    summary.rows_returned += 1;
                    if let Some(tx) = &rows {
                        let _ = tx.send(decode_row(&row)?);
                    }
                }
            }
        }
        Ok(summary)
    }

    async fn handle_export(
        &self,
        state: &mut SqliteWorkerState,
        db_id: DbId,
    ) -> Result<Vec<u8>, StoreError> {
        let db = state.database(db_id)?;
        let bytes = tokio::fs::read(&db.path).await?;
        debug!("DB: {db_id}, exported {} bytes from {}", bytes.len(), db.uri);
        Ok(bytes)
    }

    async fn handle_close(
        &self,
        state: &mut SqliteWorkerState,
        db_id: DbId,
    ) -> Result<(), StoreError> {
        let db = state
            .databases
            .remove(&db_id)
            .ok_or(StoreError::UnknownConnection(db_id))?;
        db.conn.close().await?;
        info!("DB: {db_id}, closed {}", db.uri);
        Ok(())
    }

    async fn handle_config_get(
        &self,
        state: &mut SqliteWorkerState,
    ) -> Result<WorkerConfig, StoreError> {
        let version: String = match state.databases.values_mut().next() {
            Some(db) => {
                sqlx::query_scalar("SELECT sqlite_version()")
                    .fetch_one(&mut db.conn)
                    .await?
            }
            None => {
                let mut conn = SqliteConnectOptions::from_str("sqlite::memory:")?
                    .connect()
                    .await?;
                let version: String = sqlx::query_scalar("SELECT sqlite_version()")
                    .fetch_one(&mut conn)
                    .await?;
                conn.close().await?;
                version
            }
        };
        Ok(WorkerConfig {
            version,
            vfs_list: vec![OPFS_VFS.to_string()],
            storage_root: state.storage.root().to_path_buf(),
            open_connections: state.databases.len(),
        })
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(v) => query.bind(v),
        SqlValue::Real(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Blob(v) => query.bind(v),
    }
}

/// Rebuilds a result row as a record from its column names and values.
fn decode_row(row: &SqliteRow) -> Result<Record, StoreError> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        columns.push(column.name().to_string());
        values.push(decode_value(row, idx)?);
    }
    Ok(Record::from_parts(columns, values))
}

fn decode_value(row: &SqliteRow, idx: usize) -> Result<SqlValue, StoreError> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = raw.type_info().name().to_string();
    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => SqlValue::Integer(row.try_get_unchecked(idx)?),
        "REAL" => SqlValue::Real(row.try_get_unchecked(idx)?),
        "BLOB" => SqlValue::Blob(row.try_get_unchecked(idx)?),
        _ => SqlValue::Text(row.try_get_unchecked(idx)?),
    };
    Ok(value)
}

/// Spawns a worker over `storage`.
pub async fn spawn(storage: OriginStorage) -> Result<ActorRef<WorkerMessage>, StoreError> {
    let (actor, _jh) = Actor::spawn(None, SqliteWorker, storage)
        .await
        .map_err(|e| StoreError::Channel(format!("failed to spawn SqliteWorker: {e}")))?;
    Ok(actor)
}
