//! Muxing module for ffmpeg integration.
//!
//! This module handles building and executing ffmpeg commands
//! to remux a paired video/audio fragment into one output file.
//!
//! # Architecture
//!
//! - **options_builder**: Converts an `OutputJob` into ffmpeg command tokens
//! - **muxer**: Runs ffmpeg with a timeout, with one plain retry when a
//!   hwaccel hint was used

mod muxer;
mod options_builder;

pub use muxer::{MuxError, MuxReport, Muxer};
pub use options_builder::{format_tokens_pretty, FfmpegOptionsBuilder};
