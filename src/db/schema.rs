//! SQL DDL for the two application tables.
//! Table and column names match databases written by the browser app.

/// Tasks. `TASK_ID` is assigned on insert.
/// - `LIMIT_DATE` TEXT, see `DateEncoding`
/// - `IS_FINISHED` INTEGER 0/1
pub const TODO_TASK_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS TODO_TASK(
    TASK_ID INTEGER PRIMARY KEY AUTOINCREMENT,
    CONTENT TEXT NOT NULL,
    LIMIT_DATE TEXT NOT NULL,
    PRIORITY INTEGER NOT NULL,
    MEMO TEXT,
    IS_FINISHED INTEGER NOT NULL
)
"#;

/// Users. `USER_ID` is supplied by the caller.
pub const USER_INFO_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS USER_INFO(
    USER_ID INTEGER PRIMARY KEY,
    NAME TEXT NOT NULL,
    AGE INTEGER NOT NULL,
    GENDER TEXT NOT NULL
)
"#;
