//! Media-related data structures (fragments and groups).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::enums::StreamKind;

/// One cached media file inside a group directory.
///
/// `kind` stays `Unknown` until the trimmed copy has been probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Original (header-wrapped) fragment as found in the cache.
    pub source_path: PathBuf,
    /// Header-stripped copy, once trimmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trimmed_path: Option<PathBuf>,
    /// Media kind of the trimmed copy.
    #[serde(default)]
    pub kind: StreamKind,
}

impl Fragment {
    /// Create a freshly discovered fragment.
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            trimmed_path: None,
            kind: StreamKind::Unknown,
        }
    }

    /// Record the trimmed copy.
    pub fn with_trimmed(mut self, trimmed_path: impl Into<PathBuf>) -> Self {
        self.trimmed_path = Some(trimmed_path.into());
        self
    }

    /// Record the classification result.
    pub fn with_kind(mut self, kind: StreamKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_trimmed(&self) -> bool {
        self.trimmed_path.is_some()
    }

    /// The path downstream tools should read (trimmed copy when available).
    pub fn media_path(&self) -> &Path {
        self.trimmed_path.as_deref().unwrap_or(&self.source_path)
    }

    /// File name of the original fragment, for log output.
    pub fn display_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }
}

/// One cached item: a directory with fragments, a sidecar and maybe a cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// The group's directory under the input root.
    pub directory: PathBuf,
    /// Fragments found in the directory, sorted by file name.
    pub fragments: Vec<Fragment>,
    /// Sidecar metadata record, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidecar_path: Option<PathBuf>,
    /// Cover image, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_path: Option<PathBuf>,
    /// Why the directory could not be listed; such a group skips before trimming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_error: Option<String>,
}

impl Group {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            fragments: Vec::new(),
            sidecar_path: None,
            cover_image_path: None,
            scan_error: None,
        }
    }

    /// A group whose directory could not be scanned.
    pub fn unreadable(directory: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            scan_error: Some(reason.into()),
            ..Self::new(directory)
        }
    }

    /// Directory name, used as the group's display name and log name.
    pub fn name(&self) -> String {
        self.directory
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.directory.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_path_prefers_trimmed_copy() {
        let fragment = Fragment::new("/cache/1/seg1.m4s");
        assert_eq!(fragment.media_path(), Path::new("/cache/1/seg1.m4s"));
        assert!(!fragment.is_trimmed());

        let fragment = fragment.with_trimmed("/cache/1/#seg1.m4s");
        assert_eq!(fragment.media_path(), Path::new("/cache/1/#seg1.m4s"));
        assert!(fragment.is_trimmed());
        assert_eq!(fragment.display_name(), "seg1.m4s");
    }

    #[test]
    fn group_name_is_directory_name() {
        let group = Group::new("/cache/12345");
        assert_eq!(group.name(), "12345");
        assert!(group.scan_error.is_none());
    }

    #[test]
    fn unreadable_group_keeps_its_reason() {
        let group = Group::unreadable("/cache/999", "Permission denied");
        assert_eq!(group.name(), "999");
        assert!(group.fragments.is_empty());
        assert_eq!(group.scan_error.as_deref(), Some("Permission denied"));
    }
}
