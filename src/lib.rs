pub mod config;
pub mod db;
pub mod error;
pub mod service;
pub mod sqlite3;
pub mod types;

pub use error::StoreError;
pub use service::{SaveTask, TodoService};
pub use sqlite3::{Connection, SqliteDriver, Statement};
