use crate::error::StoreError;
use crate::sqlite3::{FromRecord, Record};
use crate::types::{DateEncoding, Priority};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type TaskId = i64;
pub type UserId = i64;

/// A `TODO_TASK` row as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TodoTaskRow {
    pub task_id: TaskId,
    pub content: String,
    pub limit_date: String,
    pub priority: i64,
    pub memo: Option<String>,
    pub is_finished: i64,
}

impl FromRecord for TodoTaskRow {
    const COLUMNS: &'static [&'static str] = &[
        "TASK_ID",
        "CONTENT",
        "LIMIT_DATE",
        "PRIORITY",
        "MEMO",
        "IS_FINISHED",
    ];

    fn from_record(record: &Record) -> Result<Self, StoreError> {
        Ok(Self {
            task_id: record.get_i64("TASK_ID")?,
            content: record.get_text("CONTENT")?,
            limit_date: record.get_text("LIMIT_DATE")?,
            priority: record.get_i64("PRIORITY")?,
            memo: record.get_opt_text("MEMO")?,
            is_finished: record.get_i64("IS_FINISHED")?,
        })
    }
}

impl TodoTaskRow {
    pub fn into_entity(self, encoding: DateEncoding) -> Result<TodoTask, StoreError> {
        Ok(TodoTask {
            task_id: self.task_id,
            content: self.content,
            limit_date: encoding.decode(&self.limit_date)?,
            priority: Priority::try_from(self.priority)?,
            memo: self.memo,
            is_finished: self.is_finished == 1,
        })
    }

    pub fn from_entity(task: &TodoTask, encoding: DateEncoding) -> Self {
        Self {
            task_id: task.task_id,
            content: task.content.clone(),
            limit_date: encoding.encode(&task.limit_date),
            priority: task.priority.value(),
            memo: task.memo.clone(),
            is_finished: i64::from(task.is_finished),
        }
    }
}

/// A stored task. Detached: changes take effect only through `update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoTask {
    pub task_id: TaskId,
    pub content: String,
    pub limit_date: NaiveDateTime,
    pub priority: Priority,
    pub memo: Option<String>,
    pub is_finished: bool,
}

impl TodoTask {
    /// The caller-editable fields, e.g. for saving a copy under a new id.
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            content: self.content.clone(),
            limit_date: self.limit_date,
            priority: self.priority,
            memo: self.memo.clone(),
            is_finished: self.is_finished,
        }
    }

    pub fn from_draft(task_id: TaskId, draft: TaskDraft) -> Self {
        Self {
            task_id,
            content: draft.content,
            limit_date: draft.limit_date,
            priority: draft.priority,
            memo: draft.memo,
            is_finished: draft.is_finished,
        }
    }
}

/// Task fields supplied by a caller. The store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub content: String,
    pub limit_date: NaiveDateTime,
    pub priority: Priority,
    pub memo: Option<String>,
    /// Ignored on insert; new tasks always start unfinished.
    pub is_finished: bool,
}

impl TaskDraft {
    pub fn new(content: impl Into<String>, limit_date: NaiveDateTime, priority: Priority) -> Self {
        Self {
            content: content.into(),
            limit_date,
            priority,
            memo: None,
            is_finished: false,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// A `USER_INFO` row; the same shape is used as the entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: UserId,
    pub name: String,
    pub age: i64,
    pub gender: String,
}

impl FromRecord for UserInfo {
    const COLUMNS: &'static [&'static str] = &["USER_ID", "NAME", "AGE", "GENDER"];

    fn from_record(record: &Record) -> Result<Self, StoreError> {
        Ok(Self {
            user_id: record.get_i64("USER_ID")?,
            name: record.get_text("NAME")?,
            age: record.get_i64("AGE")?,
            gender: record.get_text("GENDER")?,
        })
    }
}
