//! External tool invocation (ffprobe, ffmpeg).
//!
//! Every external call goes through [`run_tool`], which captures output
//! and enforces the configured timeout. Callers decide what a non-zero
//! exit means for them.

mod runner;

pub use runner::{format_command, run_tool, ToolError, ToolOutput};
