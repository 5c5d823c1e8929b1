use crate::error::{MarketError, MarketResult};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;

const READ_BLOCK: usize = 64 * 1024;

/// Lowercase hex SHA-256 of the file at `path`, read block by block.
pub async fn sha256_file(path: &Path) -> MarketResult<String> {
    let mut file = fs::File::open(path)
        .await
        .map_err(|e| MarketError::fs(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BLOCK];

    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| MarketError::fs(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

pub fn checksums_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}

/// Hashes `path` and compares against `expected`. Returns the computed digest.
pub async fn verify_file(path: &Path, expected: &str) -> MarketResult<String> {
    let actual = sha256_file(path).await?;
    if !checksums_match(expected, &actual) {
        return Err(MarketError::Integrity {
            expected: expected.trim().to_ascii_lowercase(),
            actual,
        });
    }
    Ok(actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[tokio::test]
    async fn hashes_known_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty");
        let abc = dir.path().join("abc");
        std::fs::write(&empty, b"").unwrap();
        std::fs::write(&abc, b"abc").unwrap();

        assert_eq!(sha256_file(&empty).await.unwrap(), EMPTY_SHA256);
        assert_eq!(sha256_file(&abc).await.unwrap(), ABC_SHA256);
    }

    #[tokio::test]
    async fn hashing_spans_multiple_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big");
        let data: Vec<u8> = (0..(READ_BLOCK * 3 + 17)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let expected = hex::encode(Sha256::digest(&data));
        assert_eq!(sha256_file(&path).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn comparison_ignores_case_and_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let abc = dir.path().join("abc");
        std::fs::write(&abc, b"abc").unwrap();

        let upper = format!(" {} ", ABC_SHA256.to_uppercase());
        assert_eq!(verify_file(&abc, &upper).await.unwrap(), ABC_SHA256);
    }

    #[tokio::test]
    async fn mismatch_reports_both_digests() {
        let dir = tempfile::tempdir().unwrap();
        let abc = dir.path().join("abc");
        std::fs::write(&abc, b"abd").unwrap();

        match verify_file(&abc, ABC_SHA256).await.unwrap_err() {
            MarketError::Integrity { expected, actual } => {
                assert_eq!(expected, ABC_SHA256);
                assert_ne!(actual, ABC_SHA256);
                assert_eq!(actual.len(), 64);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_is_a_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sha256_file(&dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, MarketError::Filesystem { .. }));
    }
}
