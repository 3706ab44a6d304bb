//! Post-run processing utilities.
//!
//! Collects the images, documents and KMZ overlays the viewer left behind into the
//! output directory.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions recognized as viewer artifacts. Matched case-sensitively.
pub(crate) const ARTIFACT_EXTENSIONS: [&str; 3] = ["png", "pdf", "kmz"];

/// Subdirectory scanned in addition to the working directory.
const GEO_DIR: &str = "geo";

pub(crate) fn is_artifact(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ARTIFACT_EXTENSIONS.contains(&e))
}

/// `rename` refused because source and destination are on different filesystems.
fn is_cross_device(e: &std::io::Error) -> bool {
    // EXDEV on unix, ERROR_NOT_SAME_DEVICE on windows
    if cfg!(windows) {
        e.raw_os_error() == Some(17)
    } else {
        e.raw_os_error() == Some(18)
    }
}

/// Rename, or copy and remove when the rename crosses filesystems.
/// On failure the source stays where it was and no partial copy is left behind.
fn move_file(src: &Path, dest: &Path) -> std::io::Result<()> {
    match std::fs::rename(src, dest) {
        Ok(()) => return Ok(()),
        Err(e) if !is_cross_device(&e) => return Err(e),
        Err(_) => {}
    }
    std::fs::copy(src, dest)?;
    if let Err(e) = std::fs::remove_file(src) {
        let _ = std::fs::remove_file(dest);
        return Err(e);
    }
    Ok(())
}

/// Move every artifact in `workdir` and `workdir/geo` into `out_dir`.
/// Returns the destination paths, each listed once. A file that cannot be moved is
/// reported and left in place. A `geo/` file sharing a name with a workdir file
/// replaces it in `out_dir`.
pub(crate) fn relocate_artifacts(workdir: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut moved = Vec::new();
    let mut seen = HashSet::new();

    for src_dir in [workdir.to_path_buf(), workdir.join(GEO_DIR)] {
        if !src_dir.is_dir() {
            debug!("no {} directory, nothing to collect", src_dir.display());
            continue;
        }
        let mut sources: Vec<PathBuf> = std::fs::read_dir(&src_dir)
            .with_context(|| format!("failed to list {}", src_dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && is_artifact(p))
            .collect();
        sources.sort();

        for src in sources {
            let Some(name) = src.file_name() else {
                continue;
            };
            let dest = out_dir.join(name);
            match move_file(&src, &dest) {
                Ok(()) => {
                    if seen.insert(dest.clone()) {
                        moved.push(dest);
                    } else {
                        warn!("{} replaced an earlier {}", src.display(), dest.display());
                    }
                }
                Err(e) => warn!("could not move {} to {}: {e}", src.display(), dest.display()),
            }
        }
    }

    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifacts_are_moved_and_other_files_stay() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join("geo")).unwrap();
        std::fs::create_dir(root.join("pic")).unwrap();
        std::fs::write(root.join("a.png"), b"png").unwrap();
        std::fs::write(root.join("b.pdf"), b"pdf").unwrap();
        std::fs::write(root.join("geo/c.kmz"), b"kmz").unwrap();
        std::fs::write(root.join("d.txt"), b"txt").unwrap();

        let moved = relocate_artifacts(root, &root.join("pic")).unwrap();

        assert_eq!(moved.len(), 3);
        for name in ["a.png", "b.pdf", "c.kmz"] {
            assert!(root.join("pic").join(name).is_file(), "{name} not relocated");
        }
        assert!(!root.join("a.png").exists());
        assert!(!root.join("geo/c.kmz").exists());
        assert_eq!(std::fs::read(root.join("d.txt")).unwrap(), b"txt");
        assert!(!root.join("pic/d.txt").exists());
    }

    #[test]
    fn missing_geo_and_no_matches_are_fine() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("pic")).unwrap();
        let moved = relocate_artifacts(dir.path(), &dir.path().join("pic")).unwrap();
        assert!(moved.is_empty());
    }

    #[test]
    fn extension_match_is_case_sensitive() {
        assert!(is_artifact(Path::new("velocity.png")));
        assert!(is_artifact(Path::new("geo/geo_velocity.kmz")));
        assert!(!is_artifact(Path::new("velocity.PNG")));
        assert!(!is_artifact(Path::new("velocity.h5")));
        assert!(!is_artifact(Path::new("png")));
    }

    #[test]
    fn same_name_in_geo_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join("geo")).unwrap();
        std::fs::create_dir(root.join("pic")).unwrap();
        std::fs::write(root.join("x.png"), b"radar").unwrap();
        std::fs::write(root.join("geo/x.png"), b"geo").unwrap();

        let moved = relocate_artifacts(root, &root.join("pic")).unwrap();

        assert_eq!(moved, [root.join("pic/x.png")]);
        assert_eq!(std::fs::read(root.join("pic/x.png")).unwrap(), b"geo");
        assert!(!root.join("x.png").exists());
        assert!(!root.join("geo/x.png").exists());
    }

    #[test]
    fn failed_move_leaves_source_and_no_copy() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("a.png"), b"png").unwrap();
        let out = root.join("missing-pic");

        let moved = relocate_artifacts(root, &out).unwrap();

        assert!(moved.is_empty());
        assert_eq!(std::fs::read(root.join("a.png")).unwrap(), b"png");
        assert!(!out.exists());
    }

    #[test]
    fn only_cross_device_errors_fall_back_to_copy() {
        let not_found = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(!is_cross_device(&not_found));
        let code = if cfg!(windows) { 17 } else { 18 };
        assert!(is_cross_device(&std::io::Error::from_raw_os_error(code)));
    }
}
