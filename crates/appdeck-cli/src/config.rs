use std::path::PathBuf;
use std::time::Duration;

use appdeck_lifecycle::{LifecycleOptions, PrivilegePolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppdeckConfig {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub reconcile: ReconcileSettings,
    #[serde(default)]
    pub webhooks: WebhookSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppdeckConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.storage.snapshot_path.as_os_str().is_empty() {
            return Err("storage.snapshot_path must not be empty".into());
        }
        if self.reconcile.hook_timeout_ms == 0 {
            return Err("reconcile.hook_timeout_ms must be > 0".into());
        }
        if self
            .reconcile
            .implied_button_privileges
            .iter()
            .any(|p| p.trim().is_empty())
        {
            return Err("reconcile.implied_button_privileges must not contain empty entries".into());
        }
        if self.webhooks.shop_url.trim().is_empty() {
            return Err("webhooks.shop_url must not be empty".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn lifecycle_options(&self) -> LifecycleOptions {
        LifecycleOptions {
            privilege_policy: self.reconcile.privilege_policy,
            implied_button_privileges: self.reconcile.implied_button_privileges.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// JSON snapshot the in-memory store is loaded from and saved to.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("appdeck-state.json")
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSettings {
    #[serde(default)]
    pub privilege_policy: PrivilegePolicy,
    #[serde(default = "default_hook_timeout_ms")]
    pub hook_timeout_ms: u64,
    #[serde(default = "default_implied_button_privileges")]
    pub implied_button_privileges: Vec<String>,
}

fn default_hook_timeout_ms() -> u64 {
    30_000
}

fn default_implied_button_privileges() -> Vec<String> {
    LifecycleOptions::default().implied_button_privileges
}

impl ReconcileSettings {
    pub fn hook_timeout(&self) -> Duration {
        Duration::from_millis(self.hook_timeout_ms)
    }
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            privilege_policy: PrivilegePolicy::default(),
            hook_timeout_ms: default_hook_timeout_ms(),
            implied_button_privileges: default_implied_button_privileges(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSettings {
    /// Sent as `source.url` in every webhook body.
    #[serde(default = "default_shop_url")]
    pub shop_url: String,
}

fn default_shop_url() -> String {
    "http://localhost".into()
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            shop_url: default_shop_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppdeckConfig;
    use config::{Config, Environment, File, FileFormat};
    use std::path::{Path, PathBuf};

    /// Loads the TOML file, then applies `APPDECK__SECTION__KEY` overrides.
    ///
    /// An explicitly given file must exist; the default `appdeck.toml` is
    /// optional.
    pub fn load_config(path: Option<&Path>) -> Result<AppdeckConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(format!("config file not found: {}", p.display()));
                }
                builder = builder.add_source(File::from(p.to_path_buf()).format(FileFormat::Toml));
            }
            None => {
                let default_path = PathBuf::from("appdeck.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path).format(FileFormat::Toml));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("APPDECK")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let app: AppdeckConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        app.validate()?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppdeckConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.snapshot_path, PathBuf::from("appdeck-state.json"));
        assert_eq!(config.reconcile.privilege_policy, PrivilegePolicy::Exact);
        assert_eq!(config.reconcile.hook_timeout(), Duration::from_secs(30));
        assert_eq!(
            config.lifecycle_options().implied_button_privileges,
            vec!["list", "detail"]
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[storage]
snapshot_path = "/tmp/apps.json"

[reconcile]
privilege_policy = "preserve_unrelated"
hook_timeout_ms = 500

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = loader::load_config(Some(file.path())).unwrap();
        assert_eq!(config.storage.snapshot_path, PathBuf::from("/tmp/apps.json"));
        assert_eq!(
            config.reconcile.privilege_policy,
            PrivilegePolicy::PreserveUnrelated
        );
        assert_eq!(config.reconcile.hook_timeout_ms, 500);
        assert_eq!(config.webhooks.shop_url, "http://localhost");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AppdeckConfig::default();
        config.reconcile.hook_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppdeckConfig::default();
        config.logging.level = "loud".into();
        assert!(config.validate().unwrap_err().contains("logging.level"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = loader::load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.contains("not found"));
    }
}
