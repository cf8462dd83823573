use crate::db::models::{TaskDraft, TaskId, TodoTask, TodoTaskRow};
use crate::db::schema::TODO_TASK_INIT;
use crate::error::StoreError;
use crate::sqlite3::{Connection, FromRecord, SqliteDriver, Statement};
use crate::types::DateEncoding;
use tracing::debug;

/// Typed access to `TODO_TASK`.
#[derive(Clone)]
pub struct TodoTaskClient {
    driver: SqliteDriver,
    conn: Connection,
    encoding: DateEncoding,
}

impl TodoTaskClient {
    pub fn new(driver: SqliteDriver, conn: Connection, encoding: DateEncoding) -> Self {
        Self {
            driver,
            conn,
            encoding,
        }
    }

    /// Same client over another connection, e.g. after an import reopened the file.
    pub fn with_connection(&self, conn: Connection) -> Self {
        Self {
            conn,
            ..self.clone()
        }
    }

    pub async fn initialize(&self) -> Result<(), StoreError> {
        self.driver.exec(&self.conn, TODO_TASK_INIT).await?;
        Ok(())
    }

    /// Unfinished first, then by due date, priority and id.
    pub async fn select_all(&self) -> Result<Vec<TodoTask>, StoreError> {
        let sql = format!(
            "SELECT {} FROM TODO_TASK ORDER BY IS_FINISHED, LIMIT_DATE, PRIORITY, TASK_ID",
            TodoTaskRow::select_list()
        );
        let rows: Vec<TodoTaskRow> = self.driver.fetch_all(&self.conn, sql).await?;
        rows.into_iter()
            .map(|row| row.into_entity(self.encoding))
            .collect()
    }

    /// Inserts a new unfinished task and returns its id.
    pub async fn insert(&self, task: &TaskDraft) -> Result<TaskId, StoreError> {
        ensure_content(&task.content)?;
        let stmt = Statement::new(
            r#"INSERT INTO TODO_TASK(
                CONTENT, LIMIT_DATE, PRIORITY, MEMO, IS_FINISHED
            ) VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(task.content.as_str())
        .bind(self.encoding.encode(&task.limit_date))
        .bind(task.priority.value())
        .bind(task.memo.clone())
        .bind(false);
        let summary = self.driver.exec(&self.conn, stmt).await?;
        debug!("Task: {}, inserted", summary.last_insert_rowid);
        Ok(summary.last_insert_rowid)
    }

    /// Rewrites every column of the row with `task.task_id`. Returns rows changed.
    pub async fn update(&self, task: &TodoTask) -> Result<u64, StoreError> {
        ensure_content(&task.content)?;
        let row = TodoTaskRow::from_entity(task, self.encoding);
        let stmt = Statement::new(
            r#"UPDATE TODO_TASK SET
                CONTENT = :content,
                LIMIT_DATE = :limit_date,
                PRIORITY = :priority,
                MEMO = :memo,
                IS_FINISHED = :is_finished
            WHERE TASK_ID = :task_id"#,
        )
        .bind_named("content", row.content)
        .bind_named("limit_date", row.limit_date)
        .bind_named("priority", row.priority)
        .bind_named("memo", row.memo)
        .bind_named("is_finished", row.is_finished)
        .bind_named("task_id", row.task_id);
        let summary = self.driver.exec(&self.conn, stmt).await?;
        Ok(summary.rows_affected)
    }

    pub async fn update_finish(&self, task_id: TaskId, is_finished: bool) -> Result<u64, StoreError> {
        let stmt = Statement::new("UPDATE TODO_TASK SET IS_FINISHED = ? WHERE TASK_ID = ?")
            .bind(is_finished)
            .bind(task_id);
        let summary = self.driver.exec(&self.conn, stmt).await?;
        Ok(summary.rows_affected)
    }

    pub async fn delete(&self, task_id: TaskId) -> Result<u64, StoreError> {
        let stmt = Statement::new("DELETE FROM TODO_TASK WHERE TASK_ID = ?").bind(task_id);
        let summary = self.driver.exec(&self.conn, stmt).await?;
        Ok(summary.rows_affected)
    }

    pub async fn truncate_table(&self) -> Result<u64, StoreError> {
        let summary = self.driver.exec(&self.conn, "DELETE FROM TODO_TASK").await?;
        Ok(summary.rows_affected)
    }
}

fn ensure_content(content: &str) -> Result<(), StoreError> {
    if content.is_empty() {
        return Err(StoreError::EmptyContent);
    }
    Ok(())
}
