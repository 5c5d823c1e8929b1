use crate::error::{MarketError, MarketResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

static UNIQUE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// `<pid>-<n>`, distinct for every call within and across processes.
pub fn unique_tag() -> String {
    format!(
        "{}-{}",
        std::process::id(),
        UNIQUE_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

/// `<path>.<pid>-<n>.<suffix>`, next to `path`.
pub fn unique_sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}.{}", unique_tag(), suffix));
    PathBuf::from(name)
}

pub async fn ensure_dir(dir: &Path) -> MarketResult<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| MarketError::fs(dir, e))
}

/// Removes a directory tree. Returns `false` when there was nothing to remove.
pub async fn remove_dir_if_exists(dir: &Path) -> MarketResult<bool> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MarketError::fs(dir, e)),
    }
}

/// Removes a file. Returns `false` when there was nothing to remove.
pub async fn remove_file_if_exists(path: &Path) -> MarketResult<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MarketError::fs(path, e)),
    }
}

/// Moves a file into place. Falls back to copy + delete when the two paths
/// sit on different filesystems (scratch dir on tmpfs, data dir on disk); the
/// copy goes to a sibling first so `to` only ever appears complete.
pub async fn move_file(from: &Path, to: &Path) -> MarketResult<()> {
    if fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    copy_into_place(from, to).await?;
    let _ = fs::remove_file(from).await;
    Ok(())
}

async fn copy_into_place(from: &Path, to: &Path) -> MarketResult<()> {
    let tmp = unique_sibling(to, "part");
    if let Err(e) = fs::copy(from, &tmp).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(MarketError::fs(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, to).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(MarketError::fs(to, e));
    }
    Ok(())
}

/// Names of the immediate entries of `root` that satisfy `keep`, sorted.
/// A missing root yields an empty list. Hidden entries are skipped.
pub async fn list_entry_names<F>(root: &Path, keep: F) -> MarketResult<Vec<String>>
where
    F: Fn(&std::fs::FileType, &str) -> bool,
{
    let mut rd = match fs::read_dir(root).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(MarketError::fs(root, e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = rd.next_entry().await.map_err(|e| MarketError::fs(root, e))? {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| MarketError::fs(entry.path(), e))?;
        if keep(&file_type, &name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
