//! Runtime configuration, layered with the `config` crate: compiled-in
//! defaults, an optional `rustydb.toml`, then `RUSTYDB_*` environment
//! variables, in that order.

use std::path::PathBuf;

use serde::Deserialize;

use crate::common::Result;

/// Tunable knobs for the buffer pool and its backing disk manager.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of frames in the buffer pool.
    pub pool_size: usize,
    /// The `k` parameter of the LRU-K replacer.
    pub replacer_k: usize,
    /// Page size in bytes, informational only: the compiled `PAGE_SIZE`
    /// constant is authoritative and this field exists so deployments can
    /// record what they built against.
    pub page_size: usize,
    /// Path to the single-file page store.
    pub db_path: PathBuf,
    /// `log` crate level filter, e.g. "info" or "debug".
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pool_size: 64,
            replacer_k: 2,
            page_size: crate::common::constants::PAGE_SIZE,
            db_path: PathBuf::from("rustydb.db"),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from compiled defaults, an optional `path`
    /// (typically "rustydb"), and `RUSTYDB_*` environment overrides.
    ///
    /// Missing files are not an error: the defaults above still apply.
    pub fn load(path: &str) -> Result<Config> {
        let defaults = Config::default();
        let settings = config::Config::builder()
            .set_default("pool_size", defaults.pool_size as i64)?
            .set_default("replacer_k", defaults.replacer_k as i64)?
            .set_default("page_size", defaults.page_size as i64)?
            .set_default("db_path", defaults.db_path.to_string_lossy().to_string())?
            .set_default("log_level", defaults.log_level.clone())?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("RUSTYDB"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
