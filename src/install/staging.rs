use crate::error::MarketResult;
use crate::types::package::PackageKind;
use crate::utils::fs::{unique_sibling, unique_tag};
use crate::utils::logger::Logger;
use crate::utils::slug::{validate_slug, validate_version_component};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// `<slug>-<version>.<ext>`, the name a saved artifact is given.
pub fn artifact_file_name(kind: PackageKind, slug: &str, version: &str) -> MarketResult<String> {
    let slug = validate_slug(slug)?;
    let version = validate_version_component(version)?;
    Ok(format!("{}-{}.{}", slug, version, kind.artifact_extension()))
}

/// `<scratch>/<slug>-<version>.<pid>-<n>.<ext>`. Unique per call: two installs
/// of the same release each own their staged file.
pub fn staging_path(
    scratch_dir: &Path,
    kind: PackageKind,
    slug: &str,
    version: &str,
) -> MarketResult<PathBuf> {
    let slug = validate_slug(slug)?;
    let version = validate_version_component(version)?;
    Ok(scratch_dir.join(format!(
        "{}-{}.{}.{}",
        slug,
        version,
        unique_tag(),
        kind.artifact_extension()
    )))
}

/// Sibling path a download is streamed into before it is renamed to `dest`.
/// Unique per call, so two writers never interleave bytes in one file.
pub fn part_path(dest: &Path) -> PathBuf {
    unique_sibling(dest, "part")
}

/// Owns a file in the scratch area and deletes it when dropped, unless
/// [`StagedFile::keep`] was called. Dropping covers every early return and
/// an abandoned future alike.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    keep: bool,
}

impl StagedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StagedFile {
            path: path.into(),
            keep: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases ownership; the file stays on disk.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => Logger::new().warn(&format!(
                "Failed to remove staged file {}: {}",
                self.path.display(),
                e
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_are_keyed_by_slug_and_version() {
        let name = artifact_file_name(PackageKind::Plugin, "dark-mode-pro", "2.1.0").unwrap();
        assert_eq!(name, "dark-mode-pro-2.1.0.gspl");
        let name = artifact_file_name(PackageKind::IconPack, "neon", "1.0.0").unwrap();
        assert_eq!(name, "neon-1.0.0.zip");
    }

    #[test]
    fn staging_paths_are_unique_per_install() {
        let scratch = Path::new("/tmp/s");
        let a = staging_path(scratch, PackageKind::Plugin, "dark-mode-pro", "2.1.0").unwrap();
        let b = staging_path(scratch, PackageKind::Plugin, "dark-mode-pro", "2.1.0").unwrap();

        assert_ne!(a, b);
        for p in [&a, &b] {
            assert_eq!(p.parent(), Some(scratch));
            let name = p.file_name().unwrap().to_string_lossy();
            assert!(name.starts_with("dark-mode-pro-2.1.0."), "{name}");
            assert!(name.ends_with(".gspl"), "{name}");
        }
    }

    #[test]
    fn staging_rejects_hostile_components() {
        assert!(staging_path(Path::new("/s"), PackageKind::Plugin, "../x", "1.0").is_err());
        assert!(staging_path(Path::new("/s"), PackageKind::Plugin, "x", "../../1.0").is_err());
        assert!(artifact_file_name(PackageKind::Theme, "a/b", "1.0").is_err());
    }

    #[test]
    fn part_paths_are_unique_siblings() {
        let dest = Path::new("/tmp/s/neon-1.0.0.zip");
        let a = part_path(dest);
        let b = part_path(dest);
        assert_ne!(a, b);
        assert_eq!(a.parent(), dest.parent());
        assert!(a.to_string_lossy().ends_with(".part"));
    }

    #[test]
    fn guard_removes_file_unless_kept() {
        let dir = tempfile::tempdir().unwrap();
        let dropped = dir.path().join("a.zip");
        let kept = dir.path().join("b.zip");
        std::fs::write(&dropped, b"a").unwrap();
        std::fs::write(&kept, b"b").unwrap();

        drop(StagedFile::new(&dropped));
        let path = StagedFile::new(&kept).keep();

        assert!(!dropped.exists());
        assert!(path.exists());
        // Dropping a guard for a file that never appeared is fine.
        drop(StagedFile::new(dir.path().join("never.zip")));
    }
}
