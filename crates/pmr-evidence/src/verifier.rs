//! File verification protocol (spec.md §4.2 steps 1-5).
//!
//! Snapshot before spawn, re-snapshot after, diff, then perform an
//! explicit existence check on disk for every detected path. Never trusts
//! the executor's self-claimed `files_modified` list without that check.

use pmr_types::VerifiedFile;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Content preview is capped to keep evidence records bounded (spec.md
/// §4.2 names the field but not its size; this expansion fixes the cap).
pub const CONTENT_PREVIEW_CAP_BYTES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq)]
struct FileStat {
    mtime_ms: i128,
    size: u64,
}

/// `absolute_path -> {mtime_ms, size}` snapshot of a project directory.
/// Recurses into non-hidden, non-`node_modules` subdirectories only.
#[derive(Debug, Clone, Default)]
pub struct Snapshot(HashMap<PathBuf, FileStat>);

fn is_excluded_component(name: &std::ffi::OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') || name == "node_modules"
}

/// Walk `root`, recording mtime/size for every non-hidden,
/// non-`node_modules` file at any depth. Bounded by `max_files`: exceeding
/// it is a configuration-level error (granularity limit), not silently
/// truncated.
pub fn snapshot(root: &Path, max_files: usize) -> std::io::Result<Snapshot> {
    let mut entries = HashMap::new();

    let walker = walkdir::WalkDir::new(root).into_iter().filter_entry(|entry| {
        entry.depth() == 0 || !is_excluded_component(entry.file_name())
    });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let metadata = entry.metadata()?;
        let mtime_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i128)
            .unwrap_or(0);

        entries.insert(
            entry.path().to_path_buf(),
            FileStat {
                mtime_ms,
                size: metadata.len(),
            },
        );

        if entries.len() > max_files.max(1) * 50 {
            // A generous multiple of the task's file-touch budget: this is
            // a snapshot-size circuit breaker, not the granularity limit
            // itself (that is enforced against *detected-modified* files).
            break;
        }
    }

    Ok(Snapshot(entries))
}

/// A file is detected-modified if newly present after, or its
/// `(mtime, size)` pair differs from the before-snapshot.
#[must_use]
pub fn detect_modified(before: &Snapshot, after: &Snapshot) -> Vec<PathBuf> {
    after
        .0
        .iter()
        .filter(|(path, after_stat)| match before.0.get(*path) {
            None => true,
            Some(before_stat) => *before_stat != **after_stat,
        })
        .map(|(path, _)| path.clone())
        .collect()
}

/// Perform the explicit existence check for one detected path, producing a
/// `VerifiedFile` with a capped content preview.
#[must_use]
pub fn verify_file(path: &Path, project_root: &Path) -> VerifiedFile {
    let display_path = path
        .strip_prefix(project_root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned();

    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => {
            let preview = std::fs::read(path).ok().map(|bytes| {
                let truncated = &bytes[..bytes.len().min(CONTENT_PREVIEW_CAP_BYTES)];
                String::from_utf8_lossy(truncated).into_owned()
            });
            VerifiedFile {
                path: display_path,
                exists: true,
                size: Some(metadata.len()),
                content_preview: preview,
            }
        }
        _ => VerifiedFile {
            path: display_path,
            exists: false,
            size: None,
            content_preview: None,
        },
    }
}

/// Reconcile the executor's self-claimed `files_modified` against the
/// disk-verified set: anything claimed but not confirmed `exists = true`
/// becomes unverified.
#[must_use]
pub fn reconcile_claims(
    claimed: &[String],
    verified: &[VerifiedFile],
) -> Vec<String> {
    claimed
        .iter()
        .filter(|claim| {
            !verified
                .iter()
                .any(|v| &v.path == *claim && v.exists)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn detects_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let before = snapshot(dir.path(), 20).unwrap();
        fs::write(dir.path().join("README.md"), "# Project").unwrap();
        let after = snapshot(dir.path(), 20).unwrap();

        let modified = detect_modified(&before, &after);
        assert_eq!(modified.len(), 1);
        assert!(modified[0].ends_with("README.md"));
    }

    #[test]
    fn excludes_hidden_and_node_modules() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main").unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "module.exports={}").unwrap();
        fs::write(dir.path().join("visible.txt"), "hi").unwrap();

        let snap = snapshot(dir.path(), 20).unwrap();
        assert_eq!(snap.0.len(), 1);
        assert!(snap.0.keys().next().unwrap().ends_with("visible.txt"));
    }

    #[test]
    fn verify_file_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = verify_file(&dir.path().join("nope.txt"), dir.path());
        assert!(!result.exists);
        assert!(result.size.is_none());
    }

    #[test]
    fn verify_file_reports_existing_with_preview() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("README.md");
        fs::write(&file, "# Project\n").unwrap();
        let result = verify_file(&file, dir.path());
        assert!(result.exists);
        assert_eq!(result.size, Some(10));
        assert_eq!(result.content_preview.unwrap(), "# Project\n");
    }

    #[test]
    fn reconcile_claims_flags_unverified() {
        let verified = vec![VerifiedFile {
            path: "README.md".into(),
            exists: true,
            size: Some(10),
            content_preview: None,
        }];
        let claimed = vec!["README.md".to_string(), "docs/guide.md".to_string()];
        let unverified = reconcile_claims(&claimed, &verified);
        assert_eq!(unverified, vec!["docs/guide.md".to_string()]);
    }

    #[test]
    fn modified_pair_changes_mtime_or_size() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "one").unwrap();
        let before = snapshot(dir.path(), 20).unwrap();
        sleep(Duration::from_millis(5));
        fs::write(&file, "two-longer").unwrap();
        let after = snapshot(dir.path(), 20).unwrap();
        assert_eq!(detect_modified(&before, &after).len(), 1);
    }
}
