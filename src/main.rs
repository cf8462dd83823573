use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use serde::Serialize;
use sqlite_todo::config::CONFIG;
use sqlite_todo::db::{TaskDraft, TaskId, UserInfo};
use sqlite_todo::sqlite3::{Record, SqlValue, Statement};
use sqlite_todo::types::{Priority, parse_due_date};
use sqlite_todo::{SaveTask, StoreError, TodoService};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "sqlite-todo", about = "To-do list stored in a single SQLite file")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List tasks, unfinished first
    List,
    /// Add a task
    Add {
        content: String,
        #[arg(long, value_parser = parse_due_date)]
        due: NaiveDateTime,
        #[arg(long, default_value_t = Priority::Middle)]
        priority: Priority,
        #[arg(long)]
        memo: Option<String>,
    },
    /// Overwrite a task
    Edit {
        id: TaskId,
        content: String,
        #[arg(long, value_parser = parse_due_date)]
        due: NaiveDateTime,
        #[arg(long, default_value_t = Priority::Middle)]
        priority: Priority,
        #[arg(long)]
        memo: Option<String>,
        #[arg(long)]
        finished: bool,
    },
    /// Mark a task finished (or unfinished with --undo)
    Finish {
        id: TaskId,
        #[arg(long)]
        undo: bool,
    },
    /// Delete a task
    Remove { id: TaskId },
    /// Copy a task under a new id
    Duplicate { id: TaskId },
    /// Delete every task
    Clear,
    /// List users
    Users,
    /// Add a user; the id defaults to the current maximum plus one
    AddUser {
        name: String,
        age: i64,
        gender: String,
        #[arg(long)]
        id: Option<i64>,
    },
    /// Run one SQL statement with positional parameters and print the rows
    Sql { statement: String, params: Vec<String> },
    /// Write the database file to the download directory
    Export {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Replace the database with an exported file
    Import { path: PathBuf },
    /// Show worker configuration
    Info,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = &*CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        storage_root = %cfg.storage_root.display(),
        db_file = %cfg.db_file,
        date_encoding = ?cfg.date_encoding
    );

    let mut service = TodoService::from_config(cfg).await?;
    let result = run(&mut service, cli.command).await;
    service.release().await?;
    result?;
    Ok(())
}

async fn run(service: &mut TodoService, command: Command) -> Result<(), StoreError> {
    match command {
        Command::List => print_json(&service.select_all().await?),
        Command::Add {
            content,
            due,
            priority,
            memo,
        } => {
            let draft = TaskDraft {
                memo,
                ..TaskDraft::new(content, due, priority)
            };
            let id = service.save_task(SaveTask::Create(draft)).await?;
            print_json(&serde_json::json!({ "task_id": id }))
        }
        Command::Edit {
            id,
            content,
            due,
            priority,
            memo,
            finished,
        } => {
            let draft = TaskDraft {
                memo,
                is_finished: finished,
                ..TaskDraft::new(content, due, priority)
            };
            service.save_task(SaveTask::Replace(id, draft)).await?;
            print_json(&serde_json::json!({ "task_id": id }))
        }
        Command::Finish { id, undo } => {
            let changed = service.update_finish_task(id, !undo).await?;
            print_json(&serde_json::json!({ "changed": changed }))
        }
        Command::Remove { id } => {
            let changed = service.delete_task(id).await?;
            print_json(&serde_json::json!({ "changed": changed }))
        }
        Command::Duplicate { id } => {
            let tasks = service.select_all().await?;
            let Some(task) = tasks.iter().find(|t| t.task_id == id) else {
                return print_json(&serde_json::json!({ "task_id": null }));
            };
            let new_id = service.duplicate_task(task).await?;
            print_json(&serde_json::json!({ "task_id": new_id }))
        }
        Command::Clear => {
            let changed = service.truncate_table().await?;
            print_json(&serde_json::json!({ "changed": changed }))
        }
        Command::Users => print_json(&service.users().select_all().await?),
        Command::AddUser {
            name,
            age,
            gender,
            id,
        } => {
            let user_id = match id {
                Some(id) => id,
                None => service.users().next_user_id().await?,
            };
            let user = UserInfo {
                user_id,
                name,
                age,
                gender,
            };
            service.users().insert(&user).await?;
            print_json(&user)
        }
        Command::Sql { statement, params } => {
            let stmt = params
                .iter()
                .fold(Statement::new(statement), |stmt, p| stmt.bind(parse_param(p)));
            let mut rows: Vec<Record> = Vec::new();
            let summary = service
                .driver()
                .exec_with(&service.connection(), stmt, |row| rows.push(row))
                .await?;
            print_json(&serde_json::json!({ "rows": rows, "summary": summary }))
        }
        Command::Export { name, dir } => {
            let name = name.unwrap_or_else(|| service.driver().get_db_file().to_string());
            let dir = dir.unwrap_or_else(|| CONFIG.download_dir.clone());
            let path = service.download_file(dir, &name).await?;
            print_json(&serde_json::json!({ "path": path }))
        }
        Command::Import { path } => {
            service.upload_file(&path).await?;
            print_json(&serde_json::json!({ "imported": path }))
        }
        Command::Info => print_json(&service.get_config().await?),
    }
}

/// `null`, integers and reals are bound by type; anything else as text.
fn parse_param(raw: &str) -> SqlValue {
    if raw.eq_ignore_ascii_case("null") {
        SqlValue::Null
    } else if let Ok(v) = raw.parse::<i64>() {
        SqlValue::Integer(v)
    } else if let Ok(v) = raw.parse::<f64>() {
        SqlValue::Real(v)
    } else {
        SqlValue::Text(raw.to_string())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), StoreError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
