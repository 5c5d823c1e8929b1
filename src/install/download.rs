use super::staging::{StagedFile, part_path};
use crate::catalog::request::check_status;
use crate::error::{MarketError, MarketResult};
use crate::types::progress::DownloadProgress;
use crate::utils::fs::ensure_dir;
use crate::utils::logger::Logger;
use reqwest::{Client, Response};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Progress callback. Advisory only: it cannot influence the download.
pub type ProgressFn<'a> = dyn Fn(&DownloadProgress) + Send + Sync + 'a;

/// Streams `url` into `dest` and returns the number of bytes written.
///
/// Bytes land in a `.part` sibling first; `dest` appears only after the body has
/// been fully received, flushed and synced. On any failure (or if the future
/// is dropped) the partial file is removed. `progress` fires once per
/// received chunk when the server sent a Content-Length, and never otherwise.
pub async fn download_to(
    http: &Client,
    url: &str,
    dest: &Path,
    progress: Option<&ProgressFn<'_>>,
) -> MarketResult<u64> {
    Logger::new().debug(&format!("Downloading {} -> {}", url, dest.display()));

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| MarketError::Network(format!("Failed to request {}: {}", url, e)))?;
    let response = check_status(response, &format!("artifact {}", url)).await?;

    if let Some(parent) = dest.parent() {
        ensure_dir(parent).await?;
    }

    let part = StagedFile::new(part_path(dest));
    let written = stream_body(response, url, part.path(), progress).await?;

    fs::rename(part.path(), dest)
        .await
        .map_err(|e| MarketError::fs(dest, e))?;
    // Renamed away; the guard has nothing left to clean up.
    let _ = part.keep();

    Logger::new().debug(&format!("Downloaded {} bytes to {}", written, dest.display()));
    Ok(written)
}

async fn stream_body(
    mut response: Response,
    url: &str,
    part: &Path,
    progress: Option<&ProgressFn<'_>>,
) -> MarketResult<u64> {
    let total = response.content_length().unwrap_or(0);
    let mut file = fs::File::create(part)
        .await
        .map_err(|e| MarketError::fs(part, e))?;

    let mut downloaded: u64 = 0;
    let mut callback = progress;

    loop {
        let chunk = response
            .chunk()
            .await
            .map_err(|e| MarketError::Network(format!("Download of {} interrupted: {}", url, e)))?;
        let Some(chunk) = chunk else { break };

        file.write_all(&chunk)
            .await
            .map_err(|e| MarketError::fs(part, e))?;
        downloaded += chunk.len() as u64;

        if let (Some(cb), Some(p)) = (callback, DownloadProgress::new(downloaded, total)) {
            if catch_unwind(AssertUnwindSafe(|| cb(&p))).is_err() {
                Logger::new().warn(&format!(
                    "Progress callback for {} panicked; further progress for this download is dropped",
                    url
                ));
                callback = None;
            }
        }
    }

    file.flush().await.map_err(|e| MarketError::fs(part, e))?;
    file.sync_all().await.map_err(|e| MarketError::fs(part, e))?;

    if downloaded == 0 {
        return Err(MarketError::Protocol(format!(
            "{} returned an empty body",
            url
        )));
    }
    if total > 0 && downloaded != total {
        return Err(MarketError::Protocol(format!(
            "{} announced {} bytes but sent {}",
            url, total, downloaded
        )));
    }

    Ok(downloaded)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// One-shot HTTP server that writes `head` and then each chunk with a
    /// short pause, then hangs up. Gives tests control over Content-Length
    /// and over where the connection dies.
    pub(crate) async fn serve_raw(head: String, chunks: Vec<Vec<u8>>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            sock.write_all(head.as_bytes()).await.unwrap();
            for chunk in chunks {
                sock.write_all(&chunk).await.unwrap();
                sock.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        });
        format!("http://{}/artifact.zip", addr)
    }

    fn dir_listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn head_with_length(len: usize) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            len
        )
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_100() {
        let chunks = vec![vec![1u8; 300], vec![2u8; 300], vec![3u8; 400]];
        let url = serve_raw(head_with_length(1000), chunks).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("artifact.zip");

        let events: Mutex<Vec<DownloadProgress>> = Mutex::new(Vec::new());
        let record = |p: &DownloadProgress| events.lock().unwrap().push(*p);
        let written = download_to(&Client::new(), &url, &dest, Some(&record))
            .await
            .unwrap();

        assert_eq!(written, 1000);
        let events = events.into_inner().unwrap();
        assert!(!events.is_empty());
        assert!(events.windows(2).all(|w| w[0].downloaded <= w[1].downloaded));
        let last = events.last().unwrap();
        assert_eq!(last.downloaded, 1000);
        assert_eq!(last.total, 1000);
        assert_eq!(last.percent, 100.0);

        let body = std::fs::read(&dest).unwrap();
        assert_eq!(body.len(), 1000);
        assert_eq!(&body[..300], &[1u8; 300][..]);
        assert_eq!(&body[600..], &[3u8; 400][..]);
        assert_eq!(dir_listing(dir.path()), vec!["artifact.zip".to_string()]);
    }

    #[tokio::test]
    async fn interrupted_stream_leaves_nothing_behind() {
        let url = serve_raw(head_with_length(1000), vec![vec![7u8; 100]]).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("artifact.zip");

        let err = download_to(&Client::new(), &url, &dest, None)
            .await
            .unwrap_err();

        assert!(
            matches!(err, MarketError::Network(_) | MarketError::Protocol(_)),
            "{err:?}"
        );
        assert!(!dest.exists());
        assert!(dir_listing(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn unknown_length_skips_progress_but_still_downloads() {
        let head = "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_string();
        let url = serve_raw(head, vec![b"hello ".to_vec(), b"world".to_vec()]).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("theme.json");

        let calls = Mutex::new(0usize);
        let count = |_: &DownloadProgress| *calls.lock().unwrap() += 1;
        download_to(&Client::new(), &url, &dest, Some(&count))
            .await
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), 0);
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn panicking_callback_does_not_corrupt_the_file() {
        let url = serve_raw(head_with_length(8), vec![b"abcd".to_vec(), b"efgh".to_vec()]).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("artifact.zip");

        let explode = |p: &DownloadProgress| {
            if p.downloaded > 0 {
                panic!("ui thread went away");
            }
        };
        let written = download_to(&Client::new(), &url, &dest, Some(&explode))
            .await
            .unwrap();

        assert_eq!(written, 8);
        assert_eq!(std::fs::read(&dest).unwrap(), b"abcdefgh");
    }

    #[tokio::test]
    async fn missing_artifact_is_not_found_and_writes_nothing() {
        let head = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
        let url = serve_raw(head.to_string(), Vec::new()).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("artifact.zip");

        let err = download_to(&Client::new(), &url, &dest, None)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound(_)), "{err:?}");
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = download_to(
            &Client::new(),
            "http://127.0.0.1:9/artifact.zip",
            &dir.path().join("a.zip"),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MarketError::Network(_)), "{err:?}");
    }
}
