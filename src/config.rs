use crate::types::DateEncoding;
use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

/// Runtime configuration, `TODO_*` environment variables over built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory standing in for origin-private storage.
    pub storage_root: PathBuf,
    /// Logical database filename inside `storage_root`.
    pub db_file: String,
    /// Where `export` writes downloaded databases.
    pub download_dir: PathBuf,
    pub date_encoding: DateEncoding,
    pub loglevel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("opfs"),
            db_file: "todo.sqlite3".to_string(),
            download_dir: PathBuf::from("."),
            date_encoding: DateEncoding::default(),
            loglevel: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed("TODO_"))
    }
}

pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::load().expect("invalid TODO_* configuration"));
