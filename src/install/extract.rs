use crate::error::{MarketError, MarketResult};
use crate::utils::fs::unique_tag;
use crate::utils::logger::Logger;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SWAP_ATTEMPTS: usize = 3;

/// Unpacks `archive` into `dest`, which must already exist. Returns the
/// number of files written.
///
/// Every entry name is resolved against `dest` first; one that is absolute
/// or climbs out with `..` fails the whole extraction.
pub fn extract_zip(archive: &Path, dest: &Path) -> MarketResult<usize> {
    let file = fs::File::open(archive).map_err(|e| MarketError::fs(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| {
        MarketError::Extraction(format!(
            "{} is not a readable zip archive: {}",
            archive.display(),
            e
        ))
    })?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| MarketError::Extraction(format!("Failed to read entry {}: {}", i, e)))?;

        let relative = entry.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
            MarketError::Extraction(format!(
                "entry '{}' would be written outside the install directory",
                entry.name()
            ))
        })?;
        let out = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out).map_err(|e| MarketError::fs(&out, e))?;
            continue;
        }

        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| MarketError::fs(parent, e))?;
        }
        let mut target = fs::File::create(&out).map_err(|e| MarketError::fs(&out, e))?;
        io::copy(&mut entry, &mut target).map_err(|e| {
            MarketError::Extraction(format!("Failed to unpack '{}': {}", relative.display(), e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                // Owner keeps read/write so later upgrades can replace the file.
                let mode = (mode & 0o777) | 0o600;
                fs::set_permissions(&out, fs::Permissions::from_mode(mode))
                    .map_err(|e| MarketError::fs(&out, e))?;
            }
        }

        written += 1;
    }

    Ok(written)
}

/// Extracts `archive` as `<root>/<slug>`, replacing any previous copy.
///
/// Extraction happens in a hidden sibling directory; the result is only
/// renamed into place once every entry has been written. A failure at any
/// point leaves an existing `<root>/<slug>` exactly as it was.
pub fn install_archive(archive: &Path, root: &Path, slug: &str) -> MarketResult<PathBuf> {
    fs::create_dir_all(root).map_err(|e| MarketError::fs(root, e))?;

    let scratch = tempfile::Builder::new()
        .prefix(&format!(".{}.extracting-", slug))
        .tempdir_in(root)
        .map_err(|e| MarketError::fs(root, e))?;

    let files = extract_zip(archive, scratch.path())?;
    Logger::new().debug(&format!(
        "Unpacked {} files from {}",
        files,
        archive.display()
    ));

    let target = root.join(slug);
    // On success the scratch dir has been renamed away and its drop is a no-op.
    swap_into_place(scratch.path(), &target, root, slug)?;
    Ok(target)
}

/// Renames `staged` to `target`, moving any existing `target` aside first.
/// A concurrent install of the same slug can slip its own tree in between
/// the two renames; the swap is then retried so the last one wins.
fn swap_into_place(staged: &Path, target: &Path, root: &Path, slug: &str) -> MarketResult<()> {
    let mut backups: Vec<PathBuf> = Vec::new();
    let mut last_error = None;

    for _ in 0..SWAP_ATTEMPTS {
        match fs::symlink_metadata(target) {
            Ok(_) => {
                let backup = root.join(format!(".{}.previous-{}", slug, unique_tag()));
                match fs::rename(target, &backup) {
                    Ok(()) => backups.push(backup),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        restore_previous(&backups, target);
                        return Err(MarketError::fs(target, e));
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                restore_previous(&backups, target);
                return Err(MarketError::fs(target, e));
            }
        }

        match fs::rename(staged, target) {
            Ok(()) => {
                backups.iter().for_each(|b| discard(b));
                return Ok(());
            }
            Err(e) => last_error = Some(e),
        }
    }

    restore_previous(&backups, target);
    Err(MarketError::fs(
        target,
        last_error.unwrap_or_else(|| io::Error::other("directory swap did not complete")),
    ))
}

/// Puts the oldest backup back at `target` if nothing else took its place,
/// and drops the rest.
fn restore_previous(backups: &[PathBuf], target: &Path) {
    let Some((first, rest)) = backups.split_first() else {
        return;
    };
    if fs::rename(first, target).is_err() {
        discard(first);
    }
    rest.iter().for_each(|b| discard(b));
}

fn discard(path: &Path) {
    let removed = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    if let Err(e) = removed {
        Logger::new().warn(&format!(
            "Failed to remove previous copy at {}: {}",
            path.display(),
            e
        ));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// Builds an in-memory zip from `(name, contents)` pairs. Names ending in
    /// `/` become directory entries.
    pub(crate) fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        let options =
            zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    fn write_archive(dir: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join("artifact.zip");
        fs::write(&path, zip_bytes(entries)).unwrap();
        path
    }

    fn root_entries(root: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn extracts_nested_files() {
        let work = tempfile::tempdir().unwrap();
        let archive = write_archive(
            work.path(),
            &[
                ("manifest.json", b"{}"),
                ("assets/", b""),
                ("assets/icons/commit.svg", b"<svg/>"),
            ],
        );
        let dest = work.path().join("out");
        fs::create_dir(&dest).unwrap();

        assert_eq!(extract_zip(&archive, &dest).unwrap(), 2);
        assert_eq!(fs::read(dest.join("manifest.json")).unwrap(), b"{}");
        assert_eq!(
            fs::read(dest.join("assets/icons/commit.svg")).unwrap(),
            b"<svg/>"
        );
    }

    #[test]
    fn escaping_entry_fails_and_writes_nothing_outside() {
        let work = tempfile::tempdir().unwrap();
        let archive = write_archive(
            work.path(),
            &[("ok.txt", b"fine"), ("../../etc/evil", b"pwned")],
        );
        let root = work.path().join("data").join("plugins");

        let err = install_archive(&archive, &root, "sneaky").unwrap_err();

        assert!(matches!(err, MarketError::Extraction(_)), "{err:?}");
        assert!(!root.join("sneaky").exists());
        assert!(!work.path().join("etc").exists());
        assert!(!work.path().join("data").join("etc").exists());
        assert!(root_entries(&root).is_empty());
    }

    #[test]
    fn absolute_entry_is_rejected() {
        let work = tempfile::tempdir().unwrap();
        let archive = write_archive(work.path(), &[("/tmp/abs-evil", b"x")]);
        let dest = work.path().join("out");
        fs::create_dir(&dest).unwrap();

        assert!(matches!(
            extract_zip(&archive, &dest),
            Err(MarketError::Extraction(_))
        ));
    }

    #[test]
    fn corrupt_archive_is_an_extraction_error() {
        let work = tempfile::tempdir().unwrap();
        let archive = work.path().join("broken.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();
        let root = work.path().join("plugins");

        let err = install_archive(&archive, &root, "broken").unwrap_err();
        assert!(matches!(err, MarketError::Extraction(_)), "{err:?}");
        assert!(root_entries(&root).is_empty());
    }

    #[test]
    fn reinstall_replaces_previous_contents() {
        let work = tempfile::tempdir().unwrap();
        let root = work.path().join("plugins");

        let v1 = write_archive(work.path(), &[("old.txt", b"1"), ("shared.txt", b"v1")]);
        install_archive(&v1, &root, "dark-mode-pro").unwrap();

        let v2 = write_archive(work.path(), &[("shared.txt", b"v2")]);
        let target = install_archive(&v2, &root, "dark-mode-pro").unwrap();

        assert_eq!(target, root.join("dark-mode-pro"));
        assert_eq!(fs::read(target.join("shared.txt")).unwrap(), b"v2");
        assert!(!target.join("old.txt").exists());
        assert_eq!(root_entries(&root), vec!["dark-mode-pro".to_string()]);
    }

    #[test]
    fn failed_reinstall_keeps_previous_copy() {
        let work = tempfile::tempdir().unwrap();
        let root = work.path().join("plugins");

        let good = write_archive(work.path(), &[("plugin.js", b"good")]);
        install_archive(&good, &root, "dark-mode-pro").unwrap();

        let bad = write_archive(work.path(), &[("../escape", b"bad")]);
        assert!(install_archive(&bad, &root, "dark-mode-pro").is_err());

        assert_eq!(
            fs::read(root.join("dark-mode-pro").join("plugin.js")).unwrap(),
            b"good"
        );
        assert_eq!(root_entries(&root), vec!["dark-mode-pro".to_string()]);
    }
}
