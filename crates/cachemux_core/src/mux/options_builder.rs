//! ffmpeg command options builder.
//!
//! Builds command-line tokens for a stream-copy remux of one [`OutputJob`].
//!
//! # Input and stream layout
//!
//! | input | file          | mapped as            | codec                  |
//! |-------|---------------|----------------------|------------------------|
//! | 0     | video         | `0:v:0` -> `v:0`     | `copy`                 |
//! | 1     | audio         | `1:a:0` -> `a:0`     | `copy`                 |
//! | 2     | cover (opt.)  | `2:0`   -> `v:1`     | `mjpeg`, attached_pic  |
//!
//! Only the cover is encoded; the elementary streams are never touched.

use crate::models::OutputJob;

/// Builder for ffmpeg command-line options.
pub struct FfmpegOptionsBuilder<'a> {
    job: &'a OutputJob,
    hwaccel: Option<&'a str>,
}

impl<'a> FfmpegOptionsBuilder<'a> {
    pub fn new(job: &'a OutputJob) -> Self {
        Self { job, hwaccel: None }
    }

    /// Add a `-hwaccel` hint. Empty strings are ignored.
    pub fn with_hwaccel(mut self, hwaccel: Option<&'a str>) -> Self {
        self.hwaccel = hwaccel.filter(|h| !h.is_empty());
        self
    }

    /// Build the complete ffmpeg argument list (without the program name).
    pub fn build(&self) -> Vec<String> {
        let mut tokens = Vec::new();

        self.add_global_options(&mut tokens);
        self.add_inputs(&mut tokens);
        self.add_mappings(&mut tokens);
        self.add_codecs(&mut tokens);

        tokens.push(self.job.output_path.to_string_lossy().to_string());
        tokens
    }

    fn add_global_options(&self, tokens: &mut Vec<String>) {
        tokens.push("-y".to_string());
        tokens.push("-loglevel".to_string());
        tokens.push("error".to_string());

        if let Some(hwaccel) = self.hwaccel {
            tokens.push("-hwaccel".to_string());
            tokens.push(hwaccel.to_string());
        }
    }

    fn add_inputs(&self, tokens: &mut Vec<String>) {
        tokens.push("-i".to_string());
        tokens.push(self.job.video.media_path().to_string_lossy().to_string());
        tokens.push("-i".to_string());
        tokens.push(self.job.audio.media_path().to_string_lossy().to_string());

        if let Some(ref cover) = self.job.cover_image {
            tokens.push("-i".to_string());
            tokens.push(cover.to_string_lossy().to_string());
        }
    }

    fn add_mappings(&self, tokens: &mut Vec<String>) {
        tokens.push("-map".to_string());
        tokens.push("0:v:0".to_string());
        tokens.push("-map".to_string());
        tokens.push("1:a:0".to_string());

        if self.job.cover_image.is_some() {
            tokens.push("-map".to_string());
            tokens.push("2:0".to_string());
        }
    }

    fn add_codecs(&self, tokens: &mut Vec<String>) {
        tokens.push("-c:v:0".to_string());
        tokens.push("copy".to_string());
        tokens.push("-c:a:0".to_string());
        tokens.push("copy".to_string());

        if self.job.cover_image.is_some() {
            tokens.push("-c:v:1".to_string());
            tokens.push("mjpeg".to_string());
            tokens.push("-disposition:v:1".to_string());
            tokens.push("attached_pic".to_string());
        }
    }
}

/// Format tokens for pretty display (one option per line).
pub fn format_tokens_pretty(tokens: &[String]) -> String {
    let mut result = String::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if token.starts_with('-') && i + 1 < tokens.len() && !tokens[i + 1].starts_with('-') {
            // Option with value
            result.push_str(&format!("{} {} \\\n", token, tokens[i + 1]));
            i += 2;
        } else if i + 1 == tokens.len() {
            // Output file
            result.push_str(&format!("{}\n", token));
            i += 1;
        } else {
            result.push_str(&format!("{} \\\n", token));
            i += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fragment, StreamKind};
    use std::path::PathBuf;

    fn make_job() -> OutputJob {
        OutputJob::new(
            Fragment::new("/g/seg1.m4s")
                .with_trimmed("/g/#seg1.m4s")
                .with_kind(StreamKind::Video),
            Fragment::new("/g/seg2.m4s")
                .with_trimmed("/g/#seg2.m4s")
                .with_kind(StreamKind::Audio),
            "/out/Show_1_Ep1.mp4",
        )
    }

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_stream_copy_command() {
        let job = make_job();
        let tokens = FfmpegOptionsBuilder::new(&job).build();

        assert_eq!(
            tokens,
            strings(&[
                "-y", "-loglevel", "error",
                "-i", "/g/#seg1.m4s",
                "-i", "/g/#seg2.m4s",
                "-map", "0:v:0", "-map", "1:a:0",
                "-c:v:0", "copy", "-c:a:0", "copy",
                "/out/Show_1_Ep1.mp4",
            ])
        );
    }

    #[test]
    fn cover_becomes_attached_picture() {
        let job = make_job().with_cover(Some(PathBuf::from("/g/image.jpg")));
        let tokens = FfmpegOptionsBuilder::new(&job).build();

        let joined = tokens.join(" ");
        assert!(joined.contains("-i /g/image.jpg"));
        assert!(joined.contains("-map 2:0"));
        assert!(joined.contains("-c:v:1 mjpeg -disposition:v:1 attached_pic"));
        // Elementary streams are still copied
        assert!(joined.contains("-c:v:0 copy -c:a:0 copy"));
        assert_eq!(tokens.last().map(String::as_str), Some("/out/Show_1_Ep1.mp4"));
    }

    #[test]
    fn hwaccel_goes_before_inputs() {
        let job = make_job();
        let tokens = FfmpegOptionsBuilder::new(&job)
            .with_hwaccel(Some("cuda"))
            .build();

        let hw = tokens.iter().position(|t| t == "-hwaccel").unwrap();
        let first_input = tokens.iter().position(|t| t == "-i").unwrap();
        assert_eq!(tokens[hw + 1], "cuda");
        assert!(hw < first_input);

        let empty = FfmpegOptionsBuilder::new(&job).with_hwaccel(Some("")).build();
        assert!(!empty.contains(&"-hwaccel".to_string()));
    }

    #[test]
    fn pretty_format_keeps_pairs_together() {
        let pretty = format_tokens_pretty(&strings(&["-y", "-i", "/a", "/out.mp4"]));
        assert_eq!(pretty, "-y \\\n-i /a \\\n/out.mp4\n");
    }
}
