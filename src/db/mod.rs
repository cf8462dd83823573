//! Database module: entity clients over the sqlite driver.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL for the two tables
//! - `task_client.rs`, `user_client.rs`: one typed client per table

pub mod models;
pub mod schema;
pub mod task_client;
pub mod user_client;

pub use models::{TaskDraft, TaskId, TodoTask, TodoTaskRow, UserId, UserInfo};
pub use schema::{TODO_TASK_INIT, USER_INFO_INIT};
pub use task_client::TodoTaskClient;
pub use user_client::UserInfoClient;
