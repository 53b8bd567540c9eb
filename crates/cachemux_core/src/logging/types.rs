//! Logging types and configuration.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::LoggingSettings;

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive understood by `EnvFilter`.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// How a group logger filters and keeps messages.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Keep ffprobe/ffmpeg output in the tail only, instead of logging each line.
    pub compact: bool,
    /// Tool output lines kept for failure reports; 0 keeps none.
    pub error_tail: usize,
    /// Prefix file lines with the wall-clock time.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            error_tail: 20,
            timestamps: true,
        }
    }
}

impl From<&LoggingSettings> for LogConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level,
            compact: settings.compact,
            error_tail: settings.error_tail as usize,
            timestamps: true,
        }
    }
}

/// Line markers used in group logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `$ ffmpeg -y ...`
    Command,
    /// `=== Trim ===`
    Phase,
    /// `--- Executing ffmpeg ---`
    Section,
    Completed,
    Skipped,
    Warning,
    Error,
}

impl Marker {
    pub fn format(&self, message: &str) -> String {
        match self {
            Marker::Command => format!("$ {}", message),
            Marker::Phase => format!("=== {} ===", message),
            Marker::Section => format!("--- {} ---", message),
            Marker::Completed => format!("[OK] {}", message),
            Marker::Skipped => format!("[SKIP] {}", message),
            Marker::Warning => format!("[WARNING] {}", message),
            Marker::Error => format!("[ERROR] {}", message),
        }
    }
}

/// Which pipe of a child process a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStream {
    Stdout,
    Stderr,
}

/// Bounded window over the most recent tool output lines.
#[derive(Debug, Clone)]
pub struct ToolTail {
    capacity: usize,
    lines: VecDeque<String>,
}

impl ToolTail {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, line: &str) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parses_from_str() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn markers_format() {
        assert_eq!(Marker::Command.format("ffmpeg -y"), "$ ffmpeg -y");
        assert_eq!(Marker::Phase.format("Trim"), "=== Trim ===");
        assert_eq!(Marker::Skipped.format("no audio"), "[SKIP] no audio");
    }

    #[test]
    fn tail_keeps_most_recent_lines() {
        let mut tail = ToolTail::new(3);
        for i in 0..5 {
            tail.push(&format!("frame={}", i));
        }
        tail.push("Invalid data found");

        assert_eq!(tail.lines(), vec!["frame=3", "frame=4", "Invalid data found"]);
    }

    #[test]
    fn zero_capacity_tail_stays_empty() {
        let mut tail = ToolTail::new(0);
        tail.push("ignored");
        assert!(tail.is_empty());
    }
}
