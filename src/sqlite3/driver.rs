use super::record::{FromRecord, Record};
use super::statement::Statement;
use super::vfs::{OriginStorage, VfsUri, validate_filename};
use super::worker::{self, DbId, ExecSummary, WorkerConfig, WorkerMessage};
use crate::error::StoreError;

use ractor::rpc::CallResult;
use ractor::{ActorRef, RpcReplyPort};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Handle to a database opened by [`SqliteDriver::open`].
///
/// Every statement names the connection it runs on. A handle stays valid
/// until it is passed to [`SqliteDriver::close`]; after that the worker
/// rejects it with [`StoreError::UnknownConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    db_id: DbId,
}

impl Connection {
    pub fn id(&self) -> DbId {
        self.db_id
    }
}

/// Front end to a sqlite worker, bound to one logical database filename.
#[derive(Clone)]
pub struct SqliteDriver {
    worker: ActorRef<WorkerMessage>,
    storage: OriginStorage,
    uri: VfsUri,
}

impl SqliteDriver {
    /// Binds the driver to `filename` inside `storage` and starts its worker.
    pub async fn initialize(
        storage: OriginStorage,
        filename: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let filename = filename.into();
        validate_filename(&filename)?;
        let worker = worker::spawn(storage.clone()).await?;
        let uri = VfsUri::opfs(filename);
        info!(uri = %uri, root = %storage.root().display(), "SqliteDriver initialized");
        Ok(Self {
            worker,
            storage,
            uri,
        })
    }

    pub fn get_db_file(&self) -> &str {
        self.uri.filename()
    }

    pub fn vfs_uri(&self) -> &VfsUri {
        &self.uri
    }

    pub fn storage(&self) -> &OriginStorage {
        &self.storage
    }

    /// Opens the bound file, creating it if absent. Each call yields a new
    /// connection over the file's current contents.
    pub async fn open(&self) -> Result<Connection, StoreError> {
        let uri = self.uri.to_string();
        let db_id = self
            .request("Open", |reply| WorkerMessage::Open { uri, reply })
            .await?;
        Ok(Connection { db_id })
    }

    /// Runs one statement and discards any result rows.
    pub async fn exec(
        &self,
        conn: &Connection,
        statement: impl Into<Statement>,
    ) -> Result<ExecSummary, StoreError> {
        let statement = statement.into();
        let db_id = conn.db_id;
        self.request("Exec", |reply| WorkerMessage::Exec {
            db_id,
            statement,
            rows: None,
            reply,
        })
        .await
    }

    /// Runs one statement, calling `on_row` for each result row in order.
    pub async fn exec_with<F>(
        &self,
        conn: &Connection,
        statement: impl Into<Statement>,
        mut on_row: F,
    ) -> Result<ExecSummary, StoreError>
    where
        F: FnMut(Record),
    {
        let (row_tx, mut row_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = ractor::concurrency::oneshot();
        let reply: RpcReplyPort<_> = reply_tx.into();
        self.worker
            .cast(WorkerMessage::Exec {
                db_id: conn.db_id,
                statement: statement.into(),
                rows: Some(row_tx),
                reply,
            })
            .map_err(|e| StoreError::Channel(format!("Exec RPC failed: {e}")))?;

        // The worker drops its sender once the statement finishes.
        while let Some(record) = row_rx.recv().await {
            on_row(record);
        }
        reply_rx
            .await
            .map_err(|e| StoreError::Channel(format!("Exec reply dropped: {e}")))?
    }

    /// Runs a query and decodes every row with `T`'s declared columns.
    pub async fn fetch_all<T: FromRecord>(
        &self,
        conn: &Connection,
        statement: impl Into<Statement>,
    ) -> Result<Vec<T>, StoreError> {
        let mut records = Vec::new();
        self.exec_with(conn, statement, |record| records.push(record))
            .await?;
        records.iter().map(T::from_record).collect()
    }

    pub async fn close(&self, conn: Connection) -> Result<(), StoreError> {
        let db_id = conn.db_id;
        self.request("Close", |reply| WorkerMessage::Close { db_id, reply })
            .await
    }

    /// Raw bytes of the database file behind `conn`.
    pub async fn export_data(&self, conn: &Connection) -> Result<Vec<u8>, StoreError> {
        let db_id = conn.db_id;
        let bytes = self
            .request("Export", |reply| WorkerMessage::Export { db_id, reply })
            .await?;
        debug!("DB: {db_id}, export_data returned {} bytes", bytes.len());
        Ok(bytes)
    }

    pub async fn get_config(&self) -> Result<WorkerConfig, StoreError> {
        self.request("ConfigGet", WorkerMessage::ConfigGet).await
    }

    /// Stops the worker; connections still open are closed as it exits.
    pub fn shutdown(&self) {
        self.worker.stop(None);
    }

    async fn request<T, B>(&self, what: &str, build: B) -> Result<T, StoreError>
    where
        T: Send + 'static,
        B: FnOnce(RpcReplyPort<Result<T, StoreError>>) -> WorkerMessage,
    {
        match self.worker.call(build, None).await {
            Ok(CallResult::Success(result)) => result,
            Ok(CallResult::Timeout) => Err(StoreError::Channel(format!("{what} RPC timed out"))),
            Ok(CallResult::SenderError) => {
                Err(StoreError::Channel(format!("{what} reply dropped")))
            }
            Err(e) => Err(StoreError::Channel(format!("{what} RPC failed: {e}"))),
        }
    }
}
