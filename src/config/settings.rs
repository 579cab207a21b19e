use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{KeepSyncError, Result};

/// Which storage backend holds the local copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Volatile; gone when the process exits.
    Memory,
    /// Embedded SQLite file, relative paths resolve against the project dir.
    Sqlite { path: String },
    /// PostgreSQL connection string.
    Postgres { url: String },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Sqlite {
            path: ".keepsync/vault.db".to_string(),
        }
    }
}

/// Project-level configuration, loaded from `.keepsync.toml`.
///
/// Every field has a sensible default so keepsync works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the authoritative sync server.
    #[serde(default = "default_server_address")]
    pub server_address: String,

    /// Account name; also the owner id that partitions secrets.
    #[serde(default)]
    pub owner: Option<String>,

    /// Seconds between sync cycles (default: 5).
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// Deadline for the digest phase of one cycle, in seconds (default: 10).
    #[serde(default = "default_sync_timeout_secs")]
    pub sync_timeout_secs: u64,

    /// How far ahead a local version must be before it wins outright,
    /// in milliseconds (default: 1000).
    #[serde(default = "default_version_skew_ms")]
    pub version_skew_ms: u64,

    /// Pull ids the server has but this client has never seen.
    #[serde(default = "default_discover_remote_only")]
    pub discover_remote_only: bool,

    #[serde(default)]
    pub backend: BackendConfig,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_server_address() -> String {
    "http://localhost:8080".to_string()
}

fn default_sync_interval_secs() -> u64 {
    5
}

fn default_sync_timeout_secs() -> u64 {
    10
}

fn default_version_skew_ms() -> u64 {
    1_000
}

fn default_discover_remote_only() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            owner: None,
            sync_interval_secs: default_sync_interval_secs(),
            sync_timeout_secs: default_sync_timeout_secs(),
            version_skew_ms: default_version_skew_ms(),
            discover_remote_only: default_discover_remote_only(),
            backend: BackendConfig::default(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".keepsync.toml";

    /// Load settings from `<project_dir>/.keepsync.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            KeepSyncError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Write these settings to `<project_dir>/.keepsync.toml`.
    pub fn save(&self, project_dir: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| KeepSyncError::SerializationError(e.to_string()))?;
        std::fs::write(project_dir.join(Self::FILE_NAME), contents)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.sync_interval_secs == 0 {
            return Err(KeepSyncError::ConfigError(
                "sync_interval_secs must be at least 1".into(),
            ));
        }
        if self.sync_timeout_secs == 0 {
            return Err(KeepSyncError::ConfigError(
                "sync_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    pub fn version_skew(&self) -> Duration {
        Duration::from_millis(self.version_skew_ms)
    }

    /// The configured owner, or an error telling the user how to set one.
    pub fn require_owner(&self) -> Result<&str> {
        self.owner.as_deref().filter(|o| !o.is_empty()).ok_or_else(|| {
            KeepSyncError::ConfigError(format!(
                "no owner configured; set `owner` in {} or pass --owner",
                Self::FILE_NAME
            ))
        })
    }

    /// Resolve a SQLite path against the project directory.
    pub fn resolve_path(project_dir: &Path, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            project_dir.join(p)
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.server_address, "http://localhost:8080");
        assert_eq!(s.sync_interval(), Duration::from_secs(5));
        assert_eq!(s.sync_timeout(), Duration::from_secs(10));
        assert_eq!(s.version_skew(), Duration::from_secs(1));
        assert!(s.discover_remote_only);
        assert_eq!(
            s.backend,
            BackendConfig::Sqlite {
                path: ".keepsync/vault.db".into()
            }
        );
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.sync_interval_secs, 5);
        assert!(settings.owner.is_none());
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
server_address = "https://vault.example.com"
owner = "alice"
sync_interval_secs = 30
sync_timeout_secs = 4
version_skew_ms = 250
discover_remote_only = false

[backend]
kind = "postgres"
url = "postgres://localhost/keep"
"#;
        fs::write(tmp.path().join(".keepsync.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.server_address, "https://vault.example.com");
        assert_eq!(settings.require_owner().unwrap(), "alice");
        assert_eq!(settings.sync_interval_secs, 30);
        assert_eq!(settings.sync_timeout_secs, 4);
        assert_eq!(settings.version_skew_ms, 250);
        assert!(!settings.discover_remote_only);
        assert_eq!(
            settings.backend,
            BackendConfig::Postgres {
                url: "postgres://localhost/keep".into()
            }
        );
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(".keepsync.toml"),
            "owner = \"bob\"\n[backend]\nkind = \"memory\"\n",
        )
        .unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.backend, BackendConfig::Memory);
        assert_eq!(settings.sync_timeout_secs, 10);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".keepsync.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_zero_interval() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".keepsync.toml"), "sync_interval_secs = 0\n").unwrap();
        assert!(matches!(
            Settings::load(tmp.path()),
            Err(KeepSyncError::ConfigError(_))
        ));
    }

    #[test]
    fn save_then_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings {
            owner: Some("carol".into()),
            backend: BackendConfig::Memory,
            ..Settings::default()
        };
        settings.save(tmp.path()).unwrap();
        let loaded = Settings::load(tmp.path()).unwrap();
        assert_eq!(loaded.owner.as_deref(), Some("carol"));
        assert_eq!(loaded.backend, BackendConfig::Memory);
    }

    #[test]
    fn missing_owner_is_a_config_error() {
        assert!(Settings::default().require_owner().is_err());
    }

    #[test]
    fn resolve_path_respects_absolute_paths() {
        let project = Path::new("/home/user/project");
        assert_eq!(
            Settings::resolve_path(project, "data/vault.db"),
            PathBuf::from("/home/user/project/data/vault.db")
        );
        assert_eq!(
            Settings::resolve_path(project, "/var/lib/vault.db"),
            PathBuf::from("/var/lib/vault.db")
        );
    }
}
