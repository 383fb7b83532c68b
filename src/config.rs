//! Configuration for kidshelf.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (KIDSHELF_HOME, KIDSHELF_DB, KIDSHELF_ADDR)
//! 2. Config file (.kidshelf/config.yaml)
//! 3. Defaults (~/.kidshelf, catalog.db, 127.0.0.1:8080)
//!
//! Config file discovery:
//! - Searches current directory and parents for .kidshelf/config.yaml
//! - Paths in config file are relative to the config file's directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::projector::DEFAULT_PUBLIC_CATEGORY_CAP;
use crate::catalog::QueryLimits;
use crate::store::StoreOptions;

/// Resolved once per process; a load error is kept as its message
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_DB_FILE: &str = "catalog.db";

/// `.kidshelf/config.yaml` as written on disk
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub query: Option<QueryConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to the config file's directory)
    pub home: Option<String>,
    /// Database file (relative to home unless absolute)
    pub database: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    pub default_limit: Option<u32>,
    pub max_limit: Option<u32>,
    pub public_category_cap: Option<usize>,
}

/// Effective configuration after merging every source
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
    /// HTTP bind address
    pub address: String,
    /// The file that was merged, if any
    pub config_file: Option<PathBuf>,
    /// Query tuning
    pub query: QuerySettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySettings {
    pub default_limit: u32,
    pub max_limit: u32,
    pub public_category_cap: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        let limits = QueryLimits::default();
        Self {
            default_limit: limits.default_limit,
            max_limit: limits.max_limit,
            public_category_cap: DEFAULT_PUBLIC_CATEGORY_CAP,
        }
    }
}

impl QuerySettings {
    fn from_file(query: Option<&QueryConfig>) -> Self {
        let defaults = Self::default();
        let Some(query) = query else {
            return defaults;
        };

        let max_limit = query.max_limit.unwrap_or(defaults.max_limit).max(1);
        Self {
            default_limit: query
                .default_limit
                .unwrap_or(defaults.default_limit)
                .clamp(1, max_limit),
            max_limit,
            public_category_cap: query
                .public_category_cap
                .unwrap_or(defaults.public_category_cap),
        }
    }
}

impl ResolvedConfig {
    /// Store tuning derived from the query settings
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            limits: QueryLimits {
                default_limit: self.query.default_limit,
                max_limit: self.query.max_limit,
            },
            public_category_cap: self.query.public_category_cap,
        }
    }
}

/// Walk from the working directory up to the root looking for `.kidshelf/config.yaml`
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".kidshelf").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Read and deserialize one config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Discover the file, then merge it with env and defaults
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".kidshelf");

    let config_file = find_config_file();
    let file = config_file
        .as_deref()
        .map(load_config_file)
        .transpose()?;

    resolve(file, config_file, default_home, |key| std::env::var(key).ok())
}

/// Merge file, environment and defaults. `env` is injected for tests.
fn resolve(
    file: Option<ConfigFile>,
    config_file: Option<PathBuf>,
    default_home: PathBuf,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    // Paths in the file are relative to the .kidshelf/ directory
    let config_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let home = if let Some(env_home) = env("KIDSHELF_HOME") {
        PathBuf::from(env_home)
    } else if let Some(home_path) = file.as_ref().and_then(|f| f.paths.home.as_deref()) {
        resolve_path(&config_dir, home_path)
    } else {
        default_home
    };

    let database = if let Some(env_db) = env("KIDSHELF_DB") {
        PathBuf::from(env_db)
    } else if let Some(db_path) = file.as_ref().and_then(|f| f.paths.database.as_deref()) {
        resolve_path(&home, db_path)
    } else {
        home.join(DEFAULT_DB_FILE)
    };

    let address = env("KIDSHELF_ADDR")
        .or_else(|| {
            file.as_ref()
                .and_then(|f| f.server.as_ref())
                .and_then(|s| s.address.clone())
        })
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

    let query = QuerySettings::from_file(file.as_ref().and_then(|f| f.query.as_ref()));

    Ok(ResolvedConfig {
        home,
        database,
        address,
        config_file,
        query,
    })
}

/// Process-wide configuration, loaded on first use
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(None, None, PathBuf::from("/home/kid/.kidshelf"), no_env).unwrap();

        assert_eq!(config.home, PathBuf::from("/home/kid/.kidshelf"));
        assert_eq!(config.database, PathBuf::from("/home/kid/.kidshelf/catalog.db"));
        assert_eq!(config.address, "127.0.0.1:8080");
        assert_eq!(config.query, QuerySettings::default());
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".kidshelf");
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./state
  database: shelf.db
server:
  address: 0.0.0.0:9000
query:
  default_limit: 500
  max_limit: 50
  public_category_cap: 2
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.version, "1.0");

        let config = resolve(
            Some(parsed),
            Some(config_path),
            PathBuf::from("/unused"),
            no_env,
        )
        .unwrap();

        assert_eq!(config.home, dir.join("./state"));
        assert_eq!(config.database, dir.join("./state").join("shelf.db"));
        assert_eq!(config.address, "0.0.0.0:9000");
        assert_eq!(config.query.max_limit, 50);
        // default_limit is clamped to max_limit
        assert_eq!(config.query.default_limit, 50);
        assert_eq!(config.store_options().public_category_cap, 2);
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("KIDSHELF_HOME", "/srv/kidshelf"),
            ("KIDSHELF_ADDR", "127.0.0.1:3000"),
        ]
        .into_iter()
        .collect();

        let file = ConfigFile {
            version: "1.0".to_string(),
            paths: PathsConfig {
                home: Some("./ignored".to_string()),
                database: None,
            },
            server: Some(ServerConfig {
                address: Some("0.0.0.0:1".to_string()),
            }),
            query: None,
        };

        let config = resolve(Some(file), None, PathBuf::from("/unused"), |key| {
            env.get(key).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.home, PathBuf::from("/srv/kidshelf"));
        assert_eq!(config.database, PathBuf::from("/srv/kidshelf/catalog.db"));
        assert_eq!(config.address, "127.0.0.1:3000");
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/./subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
