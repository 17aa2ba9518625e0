//! Configuration for the speech synthesizer.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the player,
//! attachment cache and logging, `AppPaths` for the platform config
//! directory, and TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, CacheConfig, LoggingConfig, PlayerConfig};
