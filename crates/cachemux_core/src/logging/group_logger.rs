//! Per-group logger.
//!
//! Every message becomes a `tracing` event tagged with the group name. When
//! group log files are enabled the same lines are written to
//! `<logs_folder>/<group>.log`. Output from ffprobe/ffmpeg goes through
//! [`GroupLogger::tool_output`], which keeps a tail for failure reports.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogConfig, LogLevel, Marker, ToolStream, ToolTail};
use crate::tools::ToolOutput;

struct LogFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

pub struct GroupLogger {
    group: String,
    config: LogConfig,
    file: Mutex<Option<LogFile>>,
    tail: Mutex<ToolTail>,
}

impl GroupLogger {
    /// Logger that also writes `<log_dir>/<group>.log`, truncating an old one.
    pub fn to_file(
        group: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
    ) -> io::Result<Self> {
        let group = group.into();
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let path = log_dir.join(format!("{}.log", file_stem(&group)));
        let writer = BufWriter::new(File::create(&path)?);

        Ok(Self {
            tail: Mutex::new(ToolTail::new(config.error_tail)),
            file: Mutex::new(Some(LogFile { path, writer })),
            group,
            config,
        })
    }

    /// Logger that only emits tracing events.
    pub fn console(group: impl Into<String>, config: LogConfig) -> Self {
        Self {
            tail: Mutex::new(ToolTail::new(config.error_tail)),
            file: Mutex::new(None),
            group: group.into(),
            config,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Path of the group log file, while it is open.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.file.lock().as_ref().map(|f| f.path.clone())
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }

        let group = self.group.as_str();
        match level {
            LogLevel::Trace => tracing::trace!(group = %group, "{}", message),
            LogLevel::Debug => tracing::debug!(group = %group, "{}", message),
            LogLevel::Info => tracing::info!(group = %group, "{}", message),
            LogLevel::Warn => tracing::warn!(group = %group, "{}", message),
            LogLevel::Error => tracing::error!(group = %group, "{}", message),
        }

        if let Some(file) = self.file.lock().as_mut() {
            let _ = if self.config.timestamps {
                writeln!(file.writer, "[{}] {}", Local::now().format("%H:%M:%S"), message)
            } else {
                writeln!(file.writer, "{}", message)
            };
        }
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &Marker::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &Marker::Error.format(message));
    }

    /// A command line about to be run.
    pub fn command(&self, command: &str) {
        self.log(LogLevel::Debug, &Marker::Command.format(command));
    }

    /// Start of a pipeline step.
    pub fn phase(&self, step: &str) {
        self.log(LogLevel::Debug, &Marker::Phase.format(step));
    }

    pub fn section(&self, title: &str) {
        self.log(LogLevel::Info, &Marker::Section.format(title));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &Marker::Completed.format(message));
    }

    pub fn skipped(&self, message: &str) {
        self.log(LogLevel::Warn, &Marker::Skipped.format(message));
    }

    /// Record the output of one tool run, replacing the previous tail.
    ///
    /// Outside compact mode every line is also logged at debug level.
    pub fn tool_output(&self, tool: &str, output: &ToolOutput) {
        let streams = [
            (ToolStream::Stdout, output.stdout.as_str()),
            (ToolStream::Stderr, output.stderr.as_str()),
        ];

        let mut tail = self.tail.lock();
        tail.clear();
        for (stream, text) in streams {
            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                tail.push(line);
                if !self.config.compact {
                    let pipe = match stream {
                        ToolStream::Stdout => "",
                        ToolStream::Stderr => " stderr",
                    };
                    self.log(LogLevel::Debug, &format!("[{}{}] {}", tool, pipe, line));
                }
            }
        }
    }

    /// Lines kept from the most recent tool run.
    pub fn tail(&self) -> Vec<String> {
        self.tail.lock().lines()
    }

    /// Log the kept tail at warning level (after a tool failure).
    pub fn show_tail(&self, tool: &str) {
        let lines = self.tail();
        if lines.is_empty() {
            return;
        }
        self.log(LogLevel::Warn, &format!("[{} output, last {} lines]", tool, lines.len()));
        for line in lines {
            self.log(LogLevel::Warn, &line);
        }
    }

    /// Log a rendered ffmpeg option list, one option per line.
    pub fn options_pretty(&self, pretty: &str) {
        self.section("ffmpeg options");
        for line in pretty.lines() {
            self.info(line);
        }
    }

    /// Flush and close the log file; later messages only reach tracing.
    pub fn close(&self) {
        if let Some(mut file) = self.file.lock().take() {
            let _ = file.writer.flush();
        }
    }
}

impl Drop for GroupLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Group directory names become file names; keep them on one path level.
fn file_stem(group: &str) -> String {
    group
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn output(stdout: &str, stderr: &str) -> ToolOutput {
        ToolOutput {
            exit_code: Some(1),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn file_logger_writes_group_log() {
        let dir = tempdir().unwrap();
        let logger = GroupLogger::to_file("12345", dir.path(), LogConfig::default()).unwrap();
        let path = logger.log_path().unwrap();
        assert!(path.ends_with("12345.log"));

        logger.debug("hidden at info level");
        logger.success("Wrote Show_1_Ep1.mp4");
        logger.close();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("[OK] Wrote Show_1_Ep1.mp4"));
        assert!(!content.contains("hidden"));
        assert!(logger.log_path().is_none());
    }

    #[test]
    fn tool_output_replaces_tail() {
        let mut config = LogConfig::default();
        config.error_tail = 2;
        let logger = GroupLogger::console("g", config);

        logger.tool_output("ffmpeg", &output("a\nb\n", "c\n"));
        assert_eq!(logger.tail(), vec!["b", "c"]);

        logger.tool_output("ffmpeg", &output("", "  \nInvalid data found\n"));
        assert_eq!(logger.tail(), vec!["Invalid data found"]);
    }

    #[test]
    fn verbose_mode_logs_each_tool_line() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            level: LogLevel::Debug,
            compact: false,
            error_tail: 5,
            timestamps: false,
        };
        let logger = GroupLogger::to_file("g", dir.path(), config).unwrap();
        let path = logger.log_path().unwrap();

        logger.tool_output("ffprobe", &output("video\n", "warning\n"));
        logger.close();

        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content, "[ffprobe] video\n[ffprobe stderr] warning\n");
    }

    #[test]
    fn group_names_become_safe_file_stems() {
        assert_eq!(file_stem("12345"), "12345");
        assert_eq!(file_stem("a/b:c"), "a_b_c");
    }
}
