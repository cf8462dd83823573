use crate::config::Config;
use crate::db::{TaskDraft, TaskId, TodoTask, TodoTaskClient, UserInfoClient};
use crate::error::StoreError;
use crate::sqlite3::{
    Connection, OriginStorage, SqliteDriver, WorkerConfig, download_sqlite3_data,
    upload_sqlite3_data,
};
use crate::types::DateEncoding;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How `save_task` writes a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTask {
    /// Insert under a new store-assigned id.
    Create(TaskDraft),
    /// Overwrite the task with this id.
    Replace(TaskId, TaskDraft),
}

/// Application-level entry point: one driver, one open connection, and the
/// clients bound to it.
pub struct TodoService {
    driver: SqliteDriver,
    conn: Connection,
    tasks: TodoTaskClient,
    users: UserInfoClient,
}

impl TodoService {
    /// Starts the driver, opens `filename` and makes sure both tables exist.
    pub async fn initialize(
        storage: OriginStorage,
        filename: &str,
        encoding: DateEncoding,
    ) -> Result<Self, StoreError> {
        let driver = SqliteDriver::initialize(storage, filename).await?;
        let conn = driver.open().await?;
        let tasks = TodoTaskClient::new(driver.clone(), conn, encoding);
        let users = UserInfoClient::new(driver.clone(), conn);
        tasks.initialize().await?;
        users.initialize().await?;
        info!(db = %driver.vfs_uri(), "TodoService ready");
        Ok(Self {
            driver,
            conn,
            tasks,
            users,
        })
    }

    pub async fn from_config(cfg: &Config) -> Result<Self, StoreError> {
        Self::initialize(
            OriginStorage::new(cfg.storage_root.clone()),
            &cfg.db_file,
            cfg.date_encoding,
        )
        .await
    }

    pub fn driver(&self) -> &SqliteDriver {
        &self.driver
    }

    pub fn connection(&self) -> Connection {
        self.conn
    }

    pub fn tasks(&self) -> &TodoTaskClient {
        &self.tasks
    }

    pub fn users(&self) -> &UserInfoClient {
        &self.users
    }

    /// Closes the connection and stops the worker.
    pub async fn release(self) -> Result<(), StoreError> {
        let result = self.driver.close(self.conn).await;
        self.driver.shutdown();
        result
    }

    /// Returns the id of the written task.
    pub async fn save_task(&self, op: SaveTask) -> Result<TaskId, StoreError> {
        match op {
            SaveTask::Create(draft) => self.tasks.insert(&draft).await,
            SaveTask::Replace(task_id, draft) => {
                let changed = self
                    .tasks
                    .update(&TodoTask::from_draft(task_id, draft))
                    .await?;
                if changed == 0 {
                    info!("Task: {task_id}, replace matched no row");
                }
                Ok(task_id)
            }
        }
    }

    /// Saves a copy of `task` under a new id.
    pub async fn duplicate_task(&self, task: &TodoTask) -> Result<TaskId, StoreError> {
        self.save_task(SaveTask::Create(task.draft())).await
    }

    pub async fn update_finish_task(
        &self,
        task_id: TaskId,
        is_finished: bool,
    ) -> Result<u64, StoreError> {
        self.tasks.update_finish(task_id, is_finished).await
    }

    pub async fn delete_task(&self, task_id: TaskId) -> Result<u64, StoreError> {
        self.tasks.delete(task_id).await
    }

    pub async fn select_all(&self) -> Result<Vec<TodoTask>, StoreError> {
        self.tasks.select_all().await
    }

    pub async fn truncate_table(&self) -> Result<u64, StoreError> {
        self.tasks.truncate_table().await
    }

    /// Replaces the database with the file at `source` and rebinds the clients.
    ///
    /// On failure the service stays usable: if the old connection was already
    /// closed, whatever file is in storage is reopened.
    pub async fn upload_file(&mut self, source: impl AsRef<Path>) -> Result<(), StoreError> {
        match upload_sqlite3_data(&self.driver, Some(self.conn), source).await {
            Ok(conn) => self.rebind(conn),
            Err(e) => {
                self.reconnect_if_closed().await;
                return Err(e);
            }
        }
        self.tasks.initialize().await?;
        self.users.initialize().await?;
        Ok(())
    }

    fn rebind(&mut self, conn: Connection) {
        self.conn = conn;
        self.tasks = self.tasks.with_connection(conn);
        self.users = self.users.with_connection(conn);
    }

    async fn reconnect_if_closed(&mut self) {
        let status = self.driver.exec(&self.conn, "SELECT 1").await;
        if !matches!(status, Err(StoreError::UnknownConnection(_))) {
            return;
        }
        match self.driver.open().await {
            Ok(conn) => {
                info!("DB: {}, reopened after failed import", conn.id());
                self.rebind(conn);
            }
            Err(e) => warn!("DB: reopen after failed import failed: {}", e),
        }
    }

    pub async fn download_file(
        &self,
        dest_dir: impl AsRef<Path>,
        filename: &str,
    ) -> Result<PathBuf, StoreError> {
        download_sqlite3_data(&self.driver, &self.conn, dest_dir, filename).await
    }

    pub async fn get_config(&self) -> Result<WorkerConfig, StoreError> {
        self.driver.get_config().await
    }
}
