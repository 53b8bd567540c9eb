//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::models::{CleanupPolicy, CollisionPolicy, ProbeStrategy};

/// Header length of the cache format's fragment files.
pub const DEFAULT_HEADER_SKIP_BYTES: u64 = 9;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// How groups are read, trimmed and written.
    #[serde(default)]
    pub processing: ProcessingSettings,

    /// External tool locations and invocation options.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for input, output and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root directory holding one subdirectory per cached item.
    /// Must be absolute.
    #[serde(default)]
    pub input_root: String,

    /// Flat directory receiving muxed files. Must be absolute.
    #[serde(default)]
    pub output_root: String,

    /// Folder for per-group log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            input_root: String::new(),
            output_root: String::new(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Group processing options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSettings {
    /// Proprietary header length stripped from every fragment.
    #[serde(default = "default_header_skip_bytes")]
    pub header_skip_bytes: u64,

    /// Copy buffer size used while trimming, in KiB.
    #[serde(default = "default_buffer_size_kb")]
    pub buffer_size_kb: usize,

    /// Extension (without dot) that marks a fragment file.
    #[serde(default = "default_fragment_extension")]
    pub fragment_extension: String,

    /// File name of the sidecar metadata record.
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,

    /// File name of the optional cover image.
    #[serde(default = "default_cover_image_file")]
    pub cover_image_file: String,

    /// Prefix given to trimmed copies next to their source.
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,

    /// Extension (without dot) of muxed output files.
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Number of groups processed concurrently (1 = sequential).
    #[serde(default = "default_parallel_groups")]
    pub parallel_groups: usize,

    /// When trimmed temporaries are removed.
    #[serde(default)]
    pub cleanup_policy: CleanupPolicy,

    /// How identical output names from different groups are handled.
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
}

fn default_header_skip_bytes() -> u64 {
    DEFAULT_HEADER_SKIP_BYTES
}

fn default_buffer_size_kb() -> usize {
    1024
}

fn default_fragment_extension() -> String {
    "m4s".to_string()
}

fn default_metadata_file() -> String {
    "videoInfo.json".to_string()
}

fn default_cover_image_file() -> String {
    "image.jpg".to_string()
}

fn default_temp_prefix() -> String {
    "#".to_string()
}

fn default_output_extension() -> String {
    "mp4".to_string()
}

fn default_parallel_groups() -> usize {
    1
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            header_skip_bytes: default_header_skip_bytes(),
            buffer_size_kb: default_buffer_size_kb(),
            fragment_extension: default_fragment_extension(),
            metadata_file: default_metadata_file(),
            cover_image_file: default_cover_image_file(),
            temp_prefix: default_temp_prefix(),
            output_extension: default_output_extension(),
            parallel_groups: default_parallel_groups(),
            cleanup_policy: CleanupPolicy::default(),
            collision_policy: CollisionPolicy::default(),
        }
    }
}

impl ProcessingSettings {
    /// Trim buffer size in bytes (never zero).
    pub fn buffer_size_bytes(&self) -> usize {
        self.buffer_size_kb.max(1) * 1024
    }
}

/// External tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// ffmpeg executable (name on PATH or full path).
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe executable (name on PATH or full path).
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Stream inspection strategy.
    #[serde(default)]
    pub probe_strategy: ProbeStrategy,

    /// `-hwaccel` value passed to ffmpeg; empty disables the hint.
    #[serde(default)]
    pub hwaccel: String,

    /// Per-invocation timeout in seconds; 0 disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            probe_strategy: ProbeStrategy::default(),
            hwaccel: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ToolSettings {
    /// Timeout for one tool invocation, if enabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Hardware acceleration hint, if configured.
    pub fn hwaccel(&self) -> Option<&str> {
        let value = self.hwaccel.trim();
        (!value.is_empty()).then_some(value)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level written to the console.
    #[serde(default)]
    pub level: LogLevel,

    /// Only keep tool output in the tail buffer instead of logging every line.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines shown after a failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Log ffmpeg options one per line before muxing.
    #[serde(default)]
    pub show_options_pretty: bool,

    /// Write one log file per group under `paths.logs_folder`.
    #[serde(default)]
    pub group_logs: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            compact: true,
            error_tail: default_error_tail(),
            show_options_pretty: false,
            group_logs: false,
        }
    }
}

impl Settings {
    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.paths.logs_folder)
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Processing,
    Tools,
    Logging,
}

impl ConfigSection {
    /// All sections, in file order.
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Paths,
        ConfigSection::Processing,
        ConfigSection::Tools,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Processing => "processing",
            ConfigSection::Tools => "tools",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "# Input cache root, output folder and logs (absolute paths)",
            ConfigSection::Processing => "# Fragment trimming, naming and batch behavior",
            ConfigSection::Tools => "# ffmpeg / ffprobe invocation",
            ConfigSection::Logging => "# Logging configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[processing]"));
        assert!(toml.contains("header_skip_bytes = 9"));
    }

    #[test]
    fn settings_round_trip() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.processing.metadata_file, settings.processing.metadata_file);
        assert_eq!(parsed.tools.probe_strategy, settings.tools.probe_strategy);
        assert_eq!(parsed.logging.compact, settings.logging.compact);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[tools]\nhwaccel = \"cuda\"\ntimeout_secs = 0";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.tools.hwaccel(), Some("cuda"));
        assert_eq!(parsed.tools.timeout(), None);
        assert_eq!(parsed.tools.ffmpeg_path, "ffmpeg");
        assert_eq!(parsed.processing.fragment_extension, "m4s");
        assert_eq!(parsed.processing.cleanup_policy, CleanupPolicy::Always);
    }

    #[test]
    fn blank_hwaccel_is_no_hint() {
        let mut tools = ToolSettings::default();
        assert_eq!(tools.hwaccel(), None);
        tools.hwaccel = "  ".to_string();
        assert_eq!(tools.hwaccel(), None);
        assert_eq!(tools.timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn buffer_size_never_zero() {
        let mut processing = ProcessingSettings::default();
        assert_eq!(processing.buffer_size_bytes(), 1024 * 1024);
        processing.buffer_size_kb = 0;
        assert_eq!(processing.buffer_size_bytes(), 1024);
    }
}
