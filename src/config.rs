//! Configuration management for steward.
use regex::Regex;
use serde::Deserialize;
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};
use tracing::warn;

use crate::{
    constants::{
        DEFAULT_CACHE_DIR, DEFAULT_CONFIG_FILE, DEFAULT_DATABASE_FILE,
        DEFAULT_LOG_FILE, DEFAULT_PID_FILE, LOCK_SUFFIX,
    },
    error::SupervisorError,
};

/// Represents the structure of the configuration file.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Configuration version.
    pub version: String,
    /// The single managed service.
    pub service: ServiceConfig,
    /// Artifacts removed by `reset`.
    pub reset: Option<ResetConfig>,
    /// Root directory from which relative paths are resolved.
    #[serde(skip)]
    pub project_dir: Option<String>,
}

/// Configuration for the managed service.
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Command used both to launch the service and to re-identify it in the
    /// process table (the launch signature).
    pub command: String,
    /// Log sink the service's stdout/stderr is redirected to.
    pub log: Option<String>,
    /// Whether `start` appends to the log sink (default) or truncates it.
    pub append_log: Option<bool>,
    /// Optional environment variables for the service.
    pub env: Option<EnvConfig>,
    /// Path of the PID record file.
    pub pid_file: Option<String>,
}

/// Represents environment variables for the service.
#[derive(Debug, Deserialize, Clone)]
pub struct EnvConfig {
    /// Optional path to an environment file.
    pub file: Option<String>,
    /// Key-value pairs of environment variables.
    pub vars: Option<HashMap<String, String>>,
}

impl EnvConfig {
    /// Resolves the full path to the env file based on a base directory.
    pub fn path(&self, base: &Path) -> Option<PathBuf> {
        self.file.as_ref().map(|f| {
            let path = Path::new(f);
            if path.is_absolute() || path.exists() {
                path.to_path_buf()
            } else {
                base.join(path)
            }
        })
    }
}

/// Artifacts deleted by the `reset` operation.
#[derive(Debug, Deserialize, Clone)]
pub struct ResetConfig {
    /// The service's local database file.
    pub database: Option<String>,
    /// Cache directory names pruned recursively under the project root.
    pub cache_dirs: Option<Vec<String>>,
}

impl Config {
    /// Root directory relative paths are resolved against.
    pub fn project_root(&self) -> PathBuf {
        self.project_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn resolve(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root().join(path)
        }
    }

    /// Path of the service log sink.
    pub fn log_path(&self) -> PathBuf {
        self.resolve(self.service.log.as_deref().unwrap_or(DEFAULT_LOG_FILE))
    }

    /// Whether the log sink is opened in append mode.
    pub fn append_log(&self) -> bool {
        self.service.append_log.unwrap_or(true)
    }

    /// Path of the PID record file.
    pub fn pid_path(&self) -> PathBuf {
        self.resolve(self.service.pid_file.as_deref().unwrap_or(DEFAULT_PID_FILE))
    }

    /// Path of the start lock, derived from the PID record path.
    pub fn lock_path(&self) -> PathBuf {
        let mut path = self.pid_path().into_os_string();
        path.push(LOCK_SUFFIX);
        PathBuf::from(path)
    }

    /// Path of the database artifact removed by `reset`.
    pub fn database_path(&self) -> PathBuf {
        let raw = self
            .reset
            .as_ref()
            .and_then(|r| r.database.as_deref())
            .unwrap_or(DEFAULT_DATABASE_FILE);
        self.resolve(raw)
    }

    /// Cache directory names pruned by `reset`.
    pub fn cache_dir_names(&self) -> Vec<String> {
        self.reset
            .as_ref()
            .and_then(|r| r.cache_dirs.clone())
            .unwrap_or_else(|| vec![DEFAULT_CACHE_DIR.to_string()])
    }
}

/// Resolves the environment map for the service: entries from the env file
/// first, overridden by inline `vars`.
pub fn resolve_env(env: &Option<EnvConfig>, base: &Path) -> HashMap<String, String> {
    let mut resolved = HashMap::new();

    if let Some(env_config) = env {
        if let Some(path) = env_config.path(base) {
            match fs::read_to_string(&path) {
                Ok(content) => {
                    for line in content.lines() {
                        let line = line.trim();
                        if line.is_empty() || line.starts_with('#') {
                            continue;
                        }
                        if let Some((key, value)) = line.split_once('=') {
                            let key = key.trim().to_string();
                            let mut value = value.trim();
                            if value.starts_with('"') && value.ends_with('"') {
                                value = &value[1..value.len() - 1];
                            }
                            resolved.entry(key).or_insert_with(|| value.to_string());
                        } else {
                            warn!("Ignoring malformed line in env file: {line}");
                        }
                    }
                }
                Err(err) => {
                    warn!("Failed to read env file {}: {err}", path.display());
                }
            }
        }

        if let Some(vars) = &env_config.vars {
            for (key, value) in vars {
                resolved.insert(key.clone(), value.clone());
            }
        }
    }

    resolved
}

/// Expands `${VAR}` references within a string from the process environment.
/// Unset variables are left untouched and reported.
fn expand_env_vars(input: &str) -> String {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex");
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                warn!("Environment variable '{var_name}' is not set; leaving reference unexpanded");
                caps[0].to_string()
            }
        }
    })
    .to_string()
}

/// Loads and parses the configuration file, expanding environment variables.
pub fn load_config(config_path: Option<&str>) -> Result<Config, SupervisorError> {
    let config_path = config_path
        .map(Path::new)
        .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let content = fs::read_to_string(config_path).map_err(|e| {
        SupervisorError::ConfigRead(std::io::Error::new(
            e.kind(),
            format!("{} ({})", e, config_path.display()),
        ))
    })?;

    let expanded = expand_env_vars(&content);
    let mut config: Config =
        serde_yaml::from_str(&expanded).map_err(SupervisorError::ConfigParse)?;

    let base_path = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    config.project_dir = Some(base_path.to_string_lossy().to_string());

    Ok(config)
}
