//! Configuration domain facade.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::entities::{ModelSettings, TestgenConfig};
use crate::errors::{TestgenError, TestgenResult};

/// Config file location relative to the project directory.
pub const CONFIG_FILE: &str = ".testgen/config.json";

/// Environment variables that override the loaded file.
pub const ENV_MODEL: &str = "TESTGEN_MODEL";
pub const ENV_PROVIDER: &str = "TESTGEN_PROVIDER";
pub const ENV_BIND: &str = "TESTGEN_BIND";

/// Configuration domain facade
pub struct ConfigDomain {
    config_path: PathBuf,
}

impl ConfigDomain {
    pub fn new(project_path: impl AsRef<Path>) -> Self {
        Self {
            config_path: project_path.as_ref().join(CONFIG_FILE),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the file (defaults when absent) and apply environment overrides.
    pub async fn load(&self) -> TestgenResult<TestgenConfig> {
        let mut config = self.load_file().await?;
        apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load the file only; a missing file yields defaults.
    pub async fn load_file(&self) -> TestgenResult<TestgenConfig> {
        match fs::read_to_string(&self.config_path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| TestgenError::ConfigError {
                reason: format!("{}: {e}", self.config_path.display()),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.config_path.display(), "No config file, using defaults");
                Ok(TestgenConfig::default())
            }
            Err(e) => Err(TestgenError::FileReadError {
                path: self.config_path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Write the configuration, pretty-printed.
    pub async fn save(&self, config: &TestgenConfig) -> TestgenResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, content)
            .await
            .map_err(|e| TestgenError::FileWriteError {
                path: self.config_path.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Persist new model settings, keeping the rest of the file.
    pub async fn set_model(&self, settings: ModelSettings) -> TestgenResult<()> {
        let mut config = self.load_file().await?;
        config.model = settings;
        self.save(&config).await
    }
}

/// Apply `TESTGEN_*` environment variables over `config`.
pub fn apply_env_overrides(config: &mut TestgenConfig) {
    let read = |name: &str| {
        std::env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(model) = read(ENV_MODEL) {
        config.model.model_id = model;
    }
    if let Some(provider) = read(ENV_PROVIDER) {
        config.model.provider = provider;
    }
    if let Some(bind) = read(ENV_BIND) {
        config.server.bind_address = bind;
    }
}
