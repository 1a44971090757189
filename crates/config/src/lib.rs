//! Layered configuration: built-in defaults → persisted namespaced store →
//! `HACKARE_*` environment variables → share-link payload → CLI flags, with
//! an `offlineMode` override exception. See [`loader::build`] for the merge
//! chain and [`manager::ConfigManager`] for the live, event-publishing view.

pub mod env_subst;
pub mod error;
pub mod file;
pub mod loader;
pub mod manager;
pub mod schema;

pub use error::ConfigError;
pub use file::{discover_file_overrides, load_config_file, PartialConfig};
pub use loader::{apply_cli_overrides, apply_env_overrides, apply_share_payload, apply_store_overrides, build, persist, CliOverrides};
pub use manager::ConfigManager;
pub use schema::{ConfigSnapshot, HackareConfig, OFFLINE_BASE_URL};
