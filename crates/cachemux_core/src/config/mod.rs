//! `cachemux.toml`: paths, fragment processing, tool invocation and logging.
//!
//! [`ConfigManager`] loads the file (creating it with defaults when asked),
//! validates values with [`validate_settings`], and writes changes
//! atomically. A file with unknown or missing keys is rewritten.
//!
//! ```no_run
//! use cachemux_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new("cachemux.toml");
//! config.load_or_create()?;
//! println!("Fragments from {}", config.settings().paths.input_root);
//!
//! config.settings_mut().tools.hwaccel = "cuda".to_string();
//! config.update_section(ConfigSection::Tools)?;
//! # Ok::<(), cachemux_core::config::ConfigError>(())
//! ```

mod manager;
mod settings;

pub use manager::{validate_settings, ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, LoggingSettings, PathSettings, ProcessingSettings, Settings, ToolSettings,
    DEFAULT_HEADER_SKIP_BYTES,
};
