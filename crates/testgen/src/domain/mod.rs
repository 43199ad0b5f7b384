//! Domain facades used by the CLI and HTTP shells.

mod config;
mod generator;

pub use config::{apply_env_overrides, ConfigDomain, CONFIG_FILE, ENV_BIND, ENV_MODEL, ENV_PROVIDER};
pub use generator::{GeneratorDomain, TestCaseRun};
