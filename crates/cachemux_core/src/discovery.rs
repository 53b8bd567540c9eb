//! Group discovery under the input root.
//!
//! Every non-hidden subdirectory of the input root is one group. Inside a
//! group, files with the fragment extension are fragments, unless they carry
//! the temporary prefix (left over from an earlier run).

use std::fs;
use std::io;
use std::path::Path;

use crate::config::ProcessingSettings;
use crate::models::{Fragment, Group};

/// Scan `input_root` for groups, sorted by directory name.
///
/// Only failing to list the root itself is an error. A group directory
/// that cannot be scanned is returned as [`Group::unreadable`] so it is
/// reported as skipped instead of taking the other groups down with it.
pub fn discover_groups(input_root: &Path, settings: &ProcessingSettings) -> io::Result<Vec<Group>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(input_root)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Cannot read an entry of {}: {}", input_root.display(), e);
                continue;
            }
        };
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => dirs.push(entry.path()),
            Ok(_) => {}
            // Let the scan below report it against the group
            Err(_) => dirs.push(entry.path()),
        }
    }
    dirs.sort();

    let groups: Vec<Group> = dirs
        .iter()
        .map(|dir| {
            scan_group(dir, settings).unwrap_or_else(|e| {
                tracing::warn!("Cannot scan group {}: {}", dir.display(), e);
                Group::unreadable(dir, e.to_string())
            })
        })
        .collect();

    tracing::info!(
        "Discovered {} group(s) under {}",
        groups.len(),
        input_root.display()
    );
    Ok(groups)
}

/// Collect the fragments, sidecar and cover of one group directory.
pub fn scan_group(dir: &Path, settings: &ProcessingSettings) -> io::Result<Group> {
    let mut group = Group::new(dir);

    let mut fragment_paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if is_fragment_name(&name, settings) {
            fragment_paths.push(entry.path());
        }
    }
    fragment_paths.sort();
    group.fragments = fragment_paths.into_iter().map(Fragment::new).collect();

    let sidecar = dir.join(&settings.metadata_file);
    if sidecar.is_file() {
        group.sidecar_path = Some(sidecar);
    }

    let cover = dir.join(&settings.cover_image_file);
    if cover.is_file() {
        group.cover_image_path = Some(cover);
    }

    tracing::debug!(
        "Group {}: {} fragment(s), sidecar: {}, cover: {}",
        group.name(),
        group.fragments.len(),
        group.sidecar_path.is_some(),
        group.cover_image_path.is_some()
    );
    Ok(group)
}

fn is_fragment_name(name: &str, settings: &ProcessingSettings) -> bool {
    if !settings.temp_prefix.is_empty() && name.starts_with(&settings.temp_prefix) {
        return false;
    }
    Path::new(name)
        .extension()
        .map(|ext| {
            ext.to_string_lossy()
                .eq_ignore_ascii_case(settings.fragment_extension.trim_start_matches('.'))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn finds_groups_in_name_order() {
        let root = tempdir().unwrap();
        for name in ["200", "100", ".logs"] {
            fs::create_dir(root.path().join(name)).unwrap();
        }
        touch(&root.path().join("stray.m4s"));

        let groups = discover_groups(root.path(), &ProcessingSettings::default()).unwrap();

        let names: Vec<String> = groups.iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["100", "200"]);
    }

    #[test]
    fn scans_fragments_sidecar_and_cover() {
        let root = tempdir().unwrap();
        let dir = root.path().join("123");
        fs::create_dir(&dir).unwrap();
        for name in ["seg2.m4s", "seg1.M4S", "#seg1.m4s", "notes.txt", "videoInfo.json", "image.jpg"] {
            touch(&dir.join(name));
        }

        let group = scan_group(&dir, &ProcessingSettings::default()).unwrap();

        let fragments: Vec<String> = group.fragments.iter().map(|f| f.display_name()).collect();
        assert_eq!(fragments, vec!["seg1.M4S", "seg2.m4s"]);
        assert_eq!(group.sidecar_path, Some(dir.join("videoInfo.json")));
        assert_eq!(group.cover_image_path, Some(dir.join("image.jpg")));
    }

    #[test]
    fn sidecar_and_cover_are_optional() {
        let root = tempdir().unwrap();
        let dir = root.path().join("g");
        fs::create_dir(&dir).unwrap();
        touch(&dir.join("a.m4s"));

        let group = scan_group(&dir, &ProcessingSettings::default()).unwrap();
        assert_eq!(group.fragments.len(), 1);
        assert!(group.sidecar_path.is_none());
        assert!(group.cover_image_path.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_group_does_not_stop_discovery() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("100")).unwrap();
        let locked = root.path().join("200");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let blocked = fs::read_dir(&locked).is_err();

        let groups = discover_groups(root.path(), &ProcessingSettings::default()).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let names: Vec<String> = groups.iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["100", "200"]);
        assert!(groups[0].scan_error.is_none());
        // Permission bits do not apply to root
        if blocked {
            assert!(groups[1].scan_error.is_some());
        }
    }

    #[test]
    fn missing_root_is_error() {
        let root = tempdir().unwrap();
        assert!(discover_groups(&root.path().join("nope"), &ProcessingSettings::default()).is_err());
    }
}
