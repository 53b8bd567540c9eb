//! Fragment header stripping.
//!
//! Cached fragments carry a fixed-size proprietary header in front of an
//! otherwise valid container. Trimming copies everything after the header
//! into a sibling file whose name carries a marker prefix:
//!
//! ```text
//! <group>/seg1.m4s   [9-byte header][fMP4 payload ...]
//! <group>/#seg1.m4s  [fMP4 payload ...]
//! ```
//!
//! The copy is streamed through a fixed-size buffer, so memory use does not
//! depend on fragment size. The source is never modified.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ProcessingSettings;

/// A fragment that could not be trimmed.
#[derive(Error, Debug)]
pub enum FragmentReadError {
    #[error("Fragment not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Fragment is not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Fragment {} is {len} bytes, not longer than its {header}-byte header", .path.display())]
    TooShort { path: PathBuf, len: u64, header: u64 },

    #[error("I/O error trimming {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FragmentReadError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Strips the fixed header from fragments of one cache format.
#[derive(Debug, Clone)]
pub struct FragmentTrimmer {
    header_skip_bytes: u64,
    buffer_size: usize,
    prefix: String,
}

impl FragmentTrimmer {
    pub fn new(header_skip_bytes: u64, buffer_size: usize, prefix: impl Into<String>) -> Self {
        Self {
            header_skip_bytes,
            buffer_size: buffer_size.max(1),
            prefix: prefix.into(),
        }
    }

    pub fn from_settings(settings: &ProcessingSettings) -> Self {
        Self::new(
            settings.header_skip_bytes,
            settings.buffer_size_bytes(),
            settings.temp_prefix.clone(),
        )
    }

    pub fn header_skip_bytes(&self) -> u64 {
        self.header_skip_bytes
    }

    /// Where the trimmed copy of `source` is written.
    pub fn trimmed_path_for(&self, source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        source.with_file_name(format!("{}{}", self.prefix, name))
    }

    /// Whether a file name belongs to a trimmed copy rather than a fragment.
    pub fn is_trimmed_name(&self, file_name: &str) -> bool {
        !self.prefix.is_empty() && file_name.starts_with(&self.prefix)
    }

    /// Trim `source` next to itself and return the trimmed path.
    pub fn trim(&self, source: &Path) -> Result<PathBuf, FragmentReadError> {
        let dest = self.trimmed_path_for(source);
        trim_fragment(source, &dest, self.header_skip_bytes, self.buffer_size)?;
        Ok(dest)
    }
}

/// Copy `source[header_skip_bytes..]` to `dest`, returning bytes written.
///
/// `dest` is overwritten if present. On failure no `dest` file is left
/// behind.
pub fn trim_fragment(
    source: &Path,
    dest: &Path,
    header_skip_bytes: u64,
    buffer_size: usize,
) -> Result<u64, FragmentReadError> {
    let meta = fs::metadata(source).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FragmentReadError::Missing(source.to_path_buf()),
        _ => FragmentReadError::io(source, e),
    })?;

    if !meta.is_file() {
        return Err(FragmentReadError::NotAFile(source.to_path_buf()));
    }

    if meta.len() <= header_skip_bytes {
        return Err(FragmentReadError::TooShort {
            path: source.to_path_buf(),
            len: meta.len(),
            header: header_skip_bytes,
        });
    }

    let mut input = File::open(source).map_err(|e| FragmentReadError::io(source, e))?;
    input
        .seek(SeekFrom::Start(header_skip_bytes))
        .map_err(|e| FragmentReadError::io(source, e))?;

    let mut output = File::create(dest).map_err(|e| FragmentReadError::io(dest, e))?;

    match copy_chunked(&mut input, &mut output, buffer_size.max(1)) {
        Ok(written) => {
            tracing::debug!(
                "Trimmed {} -> {} ({} bytes)",
                source.display(),
                dest.display(),
                written
            );
            Ok(written)
        }
        Err(e) => {
            drop(output);
            let _ = fs::remove_file(dest);
            Err(FragmentReadError::io(source, e))
        }
    }
}

fn copy_chunked<R: Read, W: Write>(input: &mut R, output: &mut W, buffer_size: usize) -> io::Result<u64> {
    let mut buf = vec![0u8; buffer_size];
    let mut written = 0u64;
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        output.write_all(&buf[..n])?;
        written += n as u64;
    }
    output.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn trimmer() -> FragmentTrimmer {
        FragmentTrimmer::new(9, 4, "#")
    }

    #[test]
    fn strips_exactly_the_header() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("seg1.m4s");
        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut bytes = b"HEADER123".to_vec();
        bytes.extend_from_slice(&payload);
        fs::write(&source, &bytes).unwrap();

        let trimmed = trimmer().trim(&source).unwrap();

        assert_eq!(trimmed, dir.path().join("#seg1.m4s"));
        let out = fs::read(&trimmed).unwrap();
        assert_eq!(out.len(), bytes.len() - 9);
        assert_eq!(out, payload);
        // Source untouched
        assert_eq!(fs::read(&source).unwrap(), bytes);
    }

    #[test]
    fn one_byte_past_header_is_enough() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.m4s");
        fs::write(&source, b"123456789X").unwrap();

        let trimmed = trimmer().trim(&source).unwrap();
        assert_eq!(fs::read(trimmed).unwrap(), b"X");
    }

    #[test]
    fn short_fragments_fail_without_output() {
        let dir = tempdir().unwrap();
        for len in [0usize, 1, 8, 9] {
            let source = dir.path().join(format!("short{}.m4s", len));
            fs::write(&source, vec![7u8; len]).unwrap();

            let err = trimmer().trim(&source).unwrap_err();
            assert!(matches!(err, FragmentReadError::TooShort { .. }), "len {}", len);
            assert!(!trimmer().trimmed_path_for(&source).exists());
        }
    }

    #[test]
    fn missing_and_directory_sources_fail() {
        let dir = tempdir().unwrap();
        let err = trimmer().trim(&dir.path().join("gone.m4s")).unwrap_err();
        assert!(matches!(err, FragmentReadError::Missing(_)));

        let sub = dir.path().join("sub.m4s");
        fs::create_dir(&sub).unwrap();
        let err = trimmer().trim(&sub).unwrap_err();
        assert!(matches!(err, FragmentReadError::NotAFile(_)));
    }

    #[test]
    fn retrimming_overwrites_identically() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("seg2.m4s");
        fs::write(&source, b"000000000audio-payload").unwrap();
        let dest = trimmer().trimmed_path_for(&source);
        fs::write(&dest, b"stale content that is much longer than the payload").unwrap();

        trimmer().trim(&source).unwrap();
        let first = fs::read(&dest).unwrap();
        trimmer().trim(&source).unwrap();
        let second = fs::read(&dest).unwrap();

        assert_eq!(first, b"audio-payload");
        assert_eq!(first, second);
    }

    #[test]
    fn recognizes_trimmed_names() {
        let t = trimmer();
        assert!(t.is_trimmed_name("#seg1.m4s"));
        assert!(!t.is_trimmed_name("seg1.m4s"));
        assert!(!FragmentTrimmer::new(9, 4, "").is_trimmed_name("seg1.m4s"));
    }
}
