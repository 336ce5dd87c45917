//! Thread-safe application configuration with optional hot reloading.

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, RwLock};
use std::thread;
use std::time::Duration;

use config::{Config as RawConfig, File};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load or parse configuration file")]
    Load(#[from] config::ConfigError),

    #[error("Failed to initialize file watcher")]
    Watch(#[from] notify::Error),

    #[error("Configuration lock was poisoned, indicating a panic in another thread")]
    LockPoisoned,
}

/// Shared, read-mostly view of the loaded configuration.
///
/// Values are read with [`Config::get`] using dotted keys
/// (e.g. `"database.url"`). When built with [`ConfigBuilder::watch`], a
/// background thread swaps in a freshly parsed snapshot whenever the file
/// changes on disk; dropping the `Config` stops the watcher.
#[derive(Debug)]
pub struct Config {
    inner: Arc<RwLock<RawConfig>>,
    _watcher: Option<RecommendedWatcher>,
}

impl Config {
    pub fn builder<P: AsRef<Path>>(path: P) -> ConfigBuilder {
        ConfigBuilder::new(path.as_ref().to_path_buf())
    }

    #[cfg(any(test, feature = "testing"))]
    pub fn builder_test() -> test_utils::TestConfigBuilder {
        test_utils::TestConfigBuilder::new()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let guard = self.inner.read().map_err(|_| ConfigError::LockPoisoned)?;
        guard.get(key).map_err(ConfigError::from)
    }

    fn load(path: &Path) -> Result<RawConfig, config::ConfigError> {
        RawConfig::builder().add_source(File::from(path).required(true)).build()
    }
}

pub struct ConfigBuilder {
    path: PathBuf,
    watch: bool,
    poll_interval: Duration,
}

impl ConfigBuilder {
    fn new(path: PathBuf) -> Self {
        Self { path, watch: false, poll_interval: Duration::from_secs(2) }
    }

    /// Enables reloading the file when it changes on disk.
    pub fn watch(mut self) -> Self {
        self.watch = true;
        self
    }

    pub fn watch_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let inner = Arc::new(RwLock::new(Config::load(&self.path)?));

        let watcher = if self.watch { Some(self.spawn_watcher(Arc::clone(&inner))?) } else { None };

        Ok(Config { inner, _watcher: watcher })
    }

    fn spawn_watcher(&self, inner: Arc<RwLock<RawConfig>>) -> Result<RecommendedWatcher, ConfigError> {
        let (tx, rx) = mpsc::channel();
        let mut watcher =
            RecommendedWatcher::new(tx, notify::Config::default().with_poll_interval(self.poll_interval))?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        let path = self.path.clone();
        thread::spawn(move || {
            tracing::info!(path = %path.to_string_lossy(), "Watching configuration file for changes");

            while let Ok(event) = rx.recv() {
                match event {
                    Ok(Event { kind: EventKind::Modify(_), .. }) => match Config::load(&path) {
                        Ok(fresh) => {
                            if let Ok(mut guard) = inner.write() {
                                *guard = fresh;
                                tracing::info!("Configuration reloaded");
                            } else {
                                tracing::error!("Skipping reload: configuration lock poisoned");
                            }
                        },
                        Err(err) => tracing::error!("Failed to reload configuration file: {err}"),
                    },
                    Err(err) => tracing::error!("Configuration watcher error: {err:?}"),
                    // Access/create/remove events carry no new content.
                    _ => {},
                }
            }
        });

        Ok(watcher)
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod test_utils {
    use std::collections::HashMap;

    use config::Value;

    use super::*;

    /// Builds an in-memory [`Config`] from literal key/value overrides, so
    /// tests never touch the filesystem.
    #[derive(Default)]
    pub struct TestConfigBuilder {
        values: HashMap<String, Value>,
    }

    impl TestConfigBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with<T: Into<Value>>(mut self, key: &str, value: T) -> Self {
            self.values.insert(key.to_string(), value.into());
            self
        }

        pub fn build(self) -> Config {
            let mut builder = RawConfig::builder();
            for (key, value) in self.values {
                builder = builder.set_override(key, value).expect("override key must be valid");
            }

            let raw = builder.build().expect("test overrides must produce a valid config");
            Config { inner: Arc::new(RwLock::new(raw)), _watcher: None }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_yaml(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("failed to create temp file");
        file.write_all(content.as_bytes()).expect("failed to write temp file");
        file.flush().expect("failed to flush temp file");
        file
    }

    #[test]
    fn test_get_scalar_and_nested_keys() {
        let file = write_yaml(
            r#"
            server:
                address: "127.0.0.1:8080"
                timeout_secs: 30
            webhook:
                signing_secret: "whsec_dGVzdA=="
            "#,
        );

        let config = Config::builder(file.path()).build().expect("config should build");

        let address: String = config.get("server.address").expect("address");
        let timeout: u64 = config.get("server.timeout_secs").expect("timeout");
        let secret: String = config.get("webhook.signing_secret").expect("secret");

        assert_eq!(address, "127.0.0.1:8080");
        assert_eq!(timeout, 30);
        assert_eq!(secret, "whsec_dGVzdA==");
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let result = Config::builder("/does/not/exist/config.yaml").build();

        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_missing_key() {
        let file = write_yaml("server:\n    address: \"x\"\n");
        let config = Config::builder(file.path()).build().expect("config should build");

        assert!(config.get::<String>("server.port").is_err());
    }

    #[test]
    fn test_watch_reloads_changed_file() {
        let file = write_yaml("app: \"before\"\n");
        let config = Config::builder(file.path())
            .watch()
            .watch_interval(Duration::from_millis(100))
            .build()
            .expect("config should build");

        assert_eq!(config.get::<String>("app").expect("app"), "before");

        fs::write(file.path(), "app: \"after\"\n").expect("failed to rewrite config");
        thread::sleep(Duration::from_millis(500));

        assert_eq!(config.get::<String>("app").expect("app"), "after");
    }

    #[test]
    fn test_builder_test_overrides() {
        let config = Config::builder_test()
            .with("server.address", "0.0.0.0:9999")
            .with("database.max_connections", 5_i64)
            .build();

        assert_eq!(config.get::<String>("server.address").expect("address"), "0.0.0.0:9999");
        assert_eq!(config.get::<u32>("database.max_connections").expect("max"), 5);
    }
}
