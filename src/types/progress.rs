use serde::Serialize;

/// Cumulative progress of a single download.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: u64,
    pub percent: f64,
}

impl DownloadProgress {
    /// Returns `None` when the total size is unknown; there is nothing
    /// meaningful to report without it.
    pub fn new(downloaded: u64, total: u64) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let percent = (downloaded as f64 / total as f64 * 100.0).min(100.0);
        Some(DownloadProgress {
            downloaded,
            total,
            percent,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.downloaded >= self.total
    }
}
