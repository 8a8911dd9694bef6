//! Configuration module
//!
//! Credentials live in `~/.prior/config.json`. Every value is resolved in this
//! order (highest first):
//!
//! 1. explicit per-call override (`--api-key`, `--base-url`, ...)
//! 2. environment (`PRIOR_API_KEY`, `PRIOR_AGENT_ID`, `PRIOR_BASE_URL`)
//! 3. the persisted file
//! 4. built-in default (base URL and timeout only)
//!
//! Environment values apply to the current process only; nothing here writes
//! them back to disk.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// Service URL used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "https://share.cg3.io";

/// Request timeout used when the file does not set `timeoutSecs`
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_KEY: &str = "PRIOR_API_KEY";
pub const ENV_AGENT_ID: &str = "PRIOR_AGENT_ID";
pub const ENV_BASE_URL: &str = "PRIOR_BASE_URL";

/// Local config state could not be read or written.
///
/// A corrupt file is recoverable: resetting the file and re-registering
/// produces a fresh identity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} is not valid JSON config: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot access config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot determine the home directory for the config file")]
    NoHomeDir,
}

/// The record stored on disk.
///
/// Unknown fields are kept in `extra` and written back untouched. Snake-case
/// keys written by older SDKs are accepted on read; saves always use camelCase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedConfig {
    #[serde(default, alias = "api_key", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, alias = "agent_id", skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    #[serde(default, alias = "base_url", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, alias = "timeout_secs", skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A set of optional values layered over the persisted file.
///
/// Used both for per-call overrides and for the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub agent_id: Option<String>,
    pub base_url: Option<String>,
}

impl Overrides {
    /// Read `PRIOR_*` variables from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment, a test map, ...)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_key: lookup(ENV_API_KEY),
            agent_id: lookup(ENV_AGENT_ID),
            base_url: lookup(ENV_BASE_URL),
        }
    }
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Override,
    Env,
    File,
    Default,
    Unset,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Override => write!(f, "override"),
            Source::Env => write!(f, "env"),
            Source::File => write!(f, "file"),
            Source::Default => write!(f, "default"),
            Source::Unset => write!(f, "unset"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Origins {
    pub api_key: Source,
    pub agent_id: Source,
    pub base_url: Source,
}

/// Resolved configuration for one process
#[derive(Clone, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub agent_id: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub origins: Origins,
}

impl Config {
    /// Both credentials are present, so no registration is needed
    pub fn is_registered(&self) -> bool {
        self.api_key.is_some() && self.agent_id.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            agent_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            origins: Origins {
                api_key: Source::Unset,
                agent_id: Source::Unset,
                base_url: Source::Default,
            },
        }
    }
}

// Never print the key itself.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_deref().map(mask_secret))
            .field("agent_id", &self.agent_id)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("origins", &self.origins)
            .finish()
    }
}

/// Show only the first four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}…", visible)
}

/// Reads and writes the persisted config file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at the per-user location `~/.prior/config.json`
    pub fn default_location() -> Result<Self, ConfigError> {
        let base = directories::BaseDirs::new().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self::at(base.home_dir().join(".prior").join("config.json")))
    }

    /// Store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted record. A missing file is `Ok(None)`.
    pub fn read(&self) -> Result<Option<PersistedConfig>, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let record = serde_json::from_str(&content).map_err(|source| ConfigError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(record))
    }

    /// Resolve the effective config from overrides, environment, file and defaults
    pub fn load(&self, call: &Overrides, env: &Overrides) -> Result<Config, ConfigError> {
        let file = self.read()?.unwrap_or_default();

        let (api_key, api_key_src) = pick(&call.api_key, &env.api_key, &file.api_key);
        let (agent_id, agent_id_src) = pick(&call.agent_id, &env.agent_id, &file.agent_id);
        let (base_url, base_url_src) = match pick(&call.base_url, &env.base_url, &file.base_url) {
            (Some(url), src) => (url, src),
            (None, _) => (DEFAULT_BASE_URL.to_string(), Source::Default),
        };

        let config = Config {
            api_key,
            agent_id,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            origins: Origins {
                api_key: api_key_src,
                agent_id: agent_id_src,
                base_url: base_url_src,
            },
        };
        debug!(path = %self.path.display(), ?config, "config loaded");
        Ok(config)
    }

    /// Write the full record.
    ///
    /// The record goes to a temp file in the same directory which is then
    /// renamed over the target, so readers see either the old file or the new
    /// one. Concurrent writers: last rename wins.
    pub fn save(&self, record: &PersistedConfig) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_err)?;

        let mut content = serde_json::to_vec_pretty(record)
            .map_err(|e| io_err(std::io::Error::other(e)))?;
        content.push(b'\n');

        // NamedTempFile is created owner-only (0600) on unix.
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(&content).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        info!(path = %self.path.display(), "config saved");
        Ok(())
    }

    /// Delete the persisted file. Returns whether a file was removed.
    pub fn reset(&self) -> Result<bool, ConfigError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "config reset");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ConfigError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// First non-empty value by precedence
fn pick(
    call: &Option<String>,
    env: &Option<String>,
    file: &Option<String>,
) -> (Option<String>, Source) {
    let layers = [(call, Source::Override), (env, Source::Env), (file, Source::File)];
    for (value, source) in layers {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            return (Some(v.to_string()), source);
        }
    }
    (None, Source::Unset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::tempdir;

    fn env(base_url: Option<&str>) -> Overrides {
        Overrides {
            base_url: base_url.map(str::to_string),
            ..Overrides::default()
        }
    }

    fn registered(base_url: &str) -> PersistedConfig {
        PersistedConfig {
            api_key: Some("ask_file".to_string()),
            agent_id: Some("ag_file".to_string()),
            base_url: Some(base_url.to_string()),
            ..PersistedConfig::default()
        }
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("config.json"));

        let config = store.load(&Overrides::default(), &Overrides::default()).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.origins.base_url, Source::Default);
        assert_eq!(config.api_key, None);
        assert!(!config.is_registered());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_env_base_url_overrides_file_without_writing() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("config.json"));
        store.save(&registered("https://api.cg3.io")).unwrap();
        let before = fs::read(store.path()).unwrap();

        let config = store
            .load(&Overrides::default(), &env(Some("https://custom.example")))
            .unwrap();

        assert_eq!(config.base_url, "https://custom.example");
        assert_eq!(config.origins.base_url, Source::Env);
        assert_eq!(config.api_key.as_deref(), Some("ask_file"));
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_call_override_beats_env() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("config.json"));
        store.save(&registered("https://api.cg3.io")).unwrap();

        let call = Overrides {
            api_key: Some("ask_call".to_string()),
            base_url: Some("https://call.example/".to_string()),
            ..Overrides::default()
        };
        let env = Overrides {
            api_key: Some("ask_env".to_string()),
            base_url: Some("https://env.example".to_string()),
            ..Overrides::default()
        };

        let config = store.load(&call, &env).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("ask_call"));
        assert_eq!(config.origins.api_key, Source::Override);
        assert_eq!(config.base_url, "https://call.example");
        assert_eq!(config.agent_id.as_deref(), Some("ag_file"));
        assert_eq!(config.origins.agent_id, Source::File);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("config.json"));
        store.save(&registered("https://api.cg3.io")).unwrap();

        let env = Overrides::from_lookup(|key| match key {
            ENV_API_KEY => Some("  ".to_string()),
            ENV_BASE_URL => Some(String::new()),
            _ => None,
        });
        let config = store.load(&Overrides::default(), &env).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("ask_file"));
        assert_eq!(config.base_url, "https://api.cg3.io");
    }

    #[test]
    fn test_reads_snake_case_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"base_url": "https://share.cg3.io", "api_key": "ask_old", "agent_id": null}"#,
        )
        .unwrap();

        let record = ConfigStore::at(&path).read().unwrap().unwrap();
        assert_eq!(record.api_key.as_deref(), Some("ask_old"));
        assert_eq!(record.agent_id, None);
        assert_eq!(record.base_url.as_deref(), Some("https://share.cg3.io"));
    }

    #[test]
    fn test_unknown_fields_survive_save() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("config.json"));
        fs::write(
            store.path(),
            r#"{"apiKey": "ask_1", "agentId": "ag_1", "theme": {"color": "blue"}}"#,
        )
        .unwrap();

        let mut record = store.read().unwrap().unwrap();
        record.base_url = Some("https://api.cg3.io".to_string());
        store.save(&record).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["theme"]["color"], "blue");
        assert_eq!(raw["apiKey"], "ask_1");
        assert_eq!(raw["baseUrl"], "https://api.cg3.io");
    }

    #[test]
    fn test_corrupt_file_is_config_error() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("config.json"));
        fs::write(store.path(), "{\"apiKey\": \"ask_").unwrap();

        let err = store
            .load(&Overrides::default(), &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Corrupt { .. }));
    }

    #[test]
    fn test_non_object_file_is_config_error() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("config.json"));
        fs::write(store.path(), "[\"ask_1\", \"ag_1\"]").unwrap();

        assert!(matches!(store.read(), Err(ConfigError::Corrupt { .. })));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("nested").join(".prior").join("config.json"));

        store.save(&registered(DEFAULT_BASE_URL)).unwrap();
        assert_eq!(store.read().unwrap(), Some(registered(DEFAULT_BASE_URL)));
    }

    #[test]
    fn test_interrupted_write_leaves_previous_file() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("config.json"));
        store.save(&registered("https://api.cg3.io")).unwrap();

        // A writer that died before its rename leaves only a stray temp file.
        let mut stray = NamedTempFile::new_in(dir.path()).unwrap();
        stray.write_all(b"{\"apiKey\": \"half").unwrap();
        let (_file, _stray_path) = stray.keep().unwrap();

        assert_eq!(store.read().unwrap(), Some(registered("https://api.cg3.io")));
    }

    #[test]
    fn test_concurrent_saves_never_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let writers: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|tag| {
                let store = ConfigStore::at(&path);
                thread::spawn(move || {
                    for i in 0..50 {
                        let record = PersistedConfig {
                            api_key: Some(format!("ask_{}_{}", tag, i)),
                            agent_id: Some(format!("ag_{}", tag)),
                            base_url: Some("x".repeat(1000 * (i % 5 + 1))),
                            ..PersistedConfig::default()
                        };
                        store.save(&record).unwrap();
                    }
                })
            })
            .collect();

        let reader = ConfigStore::at(&path);
        for _ in 0..100 {
            if path.exists() {
                reader.read().expect("reader saw a partial file");
            }
        }
        for writer in writers {
            writer.join().unwrap();
        }

        let last = reader.read().unwrap().unwrap();
        assert!(last.api_key.unwrap().ends_with("_49"));
    }

    #[test]
    fn test_reset_removes_file() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("config.json"));
        assert!(!store.reset().unwrap());

        store.save(&registered(DEFAULT_BASE_URL)).unwrap();
        assert!(store.reset().unwrap());
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = Config {
            api_key: Some("ask_supersecret".to_string()),
            ..Config::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("supersecret"));
        assert!(printed.contains("ask_"));
    }
}
