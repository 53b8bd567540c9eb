//! Sidecar metadata reading and output name derivation.
//!
//! The sidecar is a small JSON object. Only three fields matter:
//!
//! | key          | meaning                  | default        |
//! |--------------|--------------------------|----------------|
//! | `title`      | part title               | `"title"`      |
//! | `groupTitle` | series / upload title    | `"groupTitle"` |
//! | `p`          | 1-based part number      | `1`            |
//!
//! Defaults apply to absent (or `null`) fields only. A sidecar that cannot
//! be read or parsed fails the whole group.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::models::Metadata;

pub const DEFAULT_TITLE: &str = "title";
pub const DEFAULT_GROUP_TITLE: &str = "groupTitle";
pub const DEFAULT_PART: u32 = 1;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("metadata file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} is not a JSON object", .0.display())]
    NotAnObject(PathBuf),

    #[error("invalid part number in {}: {value}", .path.display())]
    InvalidPart { path: PathBuf, value: String },
}

/// Read and validate the sidecar at `path`.
pub fn resolve_metadata(path: &Path) -> Result<Metadata, MetadataError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => MetadataError::Missing(path.to_path_buf()),
        _ => MetadataError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    parse_metadata(&content, path)
}

/// Parse sidecar JSON text. `path` is used for error messages only.
pub fn parse_metadata(content: &str, path: &Path) -> Result<Metadata, MetadataError> {
    let value: Value = serde_json::from_str(content).map_err(|e| MetadataError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let obj = value
        .as_object()
        .ok_or_else(|| MetadataError::NotAnObject(path.to_path_buf()))?;

    let title = text_field(obj.get("title"), DEFAULT_TITLE);
    let group_title = text_field(obj.get("groupTitle"), DEFAULT_GROUP_TITLE);
    let part = match obj.get("p") {
        None | Some(Value::Null) => DEFAULT_PART,
        Some(v) => part_number(v).ok_or_else(|| MetadataError::InvalidPart {
            path: path.to_path_buf(),
            value: v.to_string(),
        })?,
    };

    Ok(Metadata::new(title, group_title, part))
}

fn text_field(value: Option<&Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Accept `2` or `"2"`; reject zero, negatives, fractions and junk.
fn part_number(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(n).ok().filter(|p| *p >= 1)
}

/// Keep alphanumerics (any script), spaces, `_` and `-`; drop the rest.
pub fn sanitize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect()
}

/// `{groupTitle}_{part}` when the sanitized titles match, else
/// `{groupTitle}_{part}_{title}`.
pub fn derive_base_name(metadata: &Metadata) -> String {
    let title = sanitize(&metadata.title);
    let group_title = sanitize(&metadata.group_title);

    if title == group_title {
        format!("{}_{}", group_title, metadata.part)
    } else {
        format!("{}_{}_{}", group_title, metadata.part, title)
    }
}
