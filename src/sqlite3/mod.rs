//! SQLite access through a single worker actor.
//!
//! Layout:
//! - `vfs.rs`: storage root and `file:...?vfs=opfs` addressing
//! - `value.rs`, `record.rs`: dynamic values, result rows, typed decoding
//! - `statement.rs`: SQL plus positional or named parameters
//! - `worker.rs`: the actor owning every connection
//! - `driver.rs`: caller-side handle and explicit `Connection`s
//! - `transfer.rs`: import/export of the raw database file

pub mod driver;
pub mod record;
pub mod statement;
pub mod transfer;
pub mod value;
pub mod vfs;
pub mod worker;

pub use driver::{Connection, SqliteDriver};
pub use record::{FromRecord, Record};
pub use statement::{Params, Statement};
pub use transfer::{download_sqlite3_data, upload_sqlite3_bytes, upload_sqlite3_data};
pub use value::SqlValue;
pub use vfs::{OriginStorage, StagedFile, VfsUri};
pub use worker::{DbId, ExecSummary, WorkerConfig};
