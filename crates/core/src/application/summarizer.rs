// Stream Summarizer - single pass line count + SHA-256

use crate::domain::ProcessingSummary;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read buffer size; results never depend on chunk boundaries
pub const CHUNK_SIZE: usize = 8192;

/// Consume `stream` to exhaustion and summarize it
///
/// Lines are `\n`-terminated; a trailing partial line counts as one more.
/// `exclude_header` only lowers the reported count; checksum and byte count
/// always cover the whole stream.
///
/// The stream is taken by value and dropped on every exit path, so a read
/// error never leaks the underlying source.
///
/// # Errors
/// Propagates the first read error. No partial summary is returned.
pub async fn summarize<R>(mut stream: R, exclude_header: bool) -> std::io::Result<ProcessingSummary>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total_bytes: u64 = 0;
    let mut newlines: u64 = 0;
    let mut last_byte: Option<u8> = None;

    loop {
        let read = stream.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        let chunk = &buffer[..read];
        hasher.update(chunk);
        total_bytes += read as u64;
        newlines += chunk.iter().filter(|&&b| b == b'\n').count() as u64;
        last_byte = Some(chunk[read - 1]);
    }

    let mut total_lines = match last_byte {
        None => 0,
        Some(b'\n') => newlines,
        Some(_) => newlines + 1,
    };
    if exclude_header && total_lines > 0 {
        total_lines -= 1;
    }

    Ok(ProcessingSummary {
        total_lines,
        checksum: hex::encode(hasher.finalize()),
        total_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio_test::io::Builder;

    fn sha256_hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    async fn run(data: &[u8], exclude_header: bool) -> ProcessingSummary {
        summarize(Cursor::new(data.to_vec()), exclude_header)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let summary = run(b"", false).await;
        assert_eq!(summary.total_lines, 0);
        assert_eq!(summary.total_bytes, 0);
        assert_eq!(
            summary.checksum,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );

        assert_eq!(run(b"", true).await.total_lines, 0);
    }

    #[tokio::test]
    async fn test_trailing_newline() {
        assert_eq!(run(b"a,b\n1,2\n", false).await.total_lines, 2);
        assert_eq!(run(b"a,b\n1,2\n", true).await.total_lines, 1);
    }

    #[tokio::test]
    async fn test_partial_trailing_line_counts() {
        assert_eq!(run(b"h1,h2\n1,2\n3,4", false).await.total_lines, 3);
        assert_eq!(run(b"h1,h2\n1,2\n3,4", true).await.total_lines, 2);
    }

    #[tokio::test]
    async fn test_single_header_only() {
        assert_eq!(run(b"header", false).await.total_lines, 1);
        assert_eq!(run(b"header", true).await.total_lines, 0);
        assert_eq!(run(b"\n", false).await.total_lines, 1);
    }

    #[tokio::test]
    async fn test_checksum_matches_direct_digest() {
        let data = b"id,name\n1,alice\n2,bob\n";
        let summary = run(data, false).await;
        assert_eq!(summary.checksum, sha256_hex(data));
        assert_eq!(summary.checksum.len(), 64);
        assert!(summary.checksum.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_eq!(summary.total_bytes, data.len() as u64);

        // repeatable
        assert_eq!(run(data, false).await, summary);
    }

    #[tokio::test]
    async fn test_exclude_header_only_changes_count() {
        let data = b"h\n1\n2\n3";
        let full = run(data, false).await;
        let body = run(data, true).await;

        assert_eq!(body.total_lines, full.total_lines - 1);
        assert_eq!(body.checksum, full.checksum);
        assert_eq!(body.total_bytes, full.total_bytes);
    }

    #[tokio::test]
    async fn test_chunk_boundaries_do_not_matter() {
        let data = b"a,b\n1,2\n\n3,4";
        let chunked = Builder::new()
            .read(b"a,b")
            .read(b"\n")
            .read(b"1,2\n")
            .read(b"\n3")
            .read(b",4")
            .build();

        let summary = summarize(chunked, false).await.unwrap();
        assert_eq!(summary, run(data, false).await);
        assert_eq!(summary.total_lines, 4);
    }

    #[tokio::test]
    async fn test_input_larger_than_chunk() {
        let line = b"0123456789,abcdefghij\n";
        let data: Vec<u8> = line.iter().copied().cycle().take(line.len() * 1000).collect();
        assert!(data.len() > CHUNK_SIZE);

        let summary = run(&data, false).await;
        assert_eq!(summary.total_lines, 1000);
        assert_eq!(summary.total_bytes, data.len() as u64);
        assert_eq!(summary.checksum, sha256_hex(&data));
    }

    #[tokio::test]
    async fn test_read_error_propagates() {
        let failing = Builder::new()
            .read(b"a,b\n")
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))
            .build();

        let err = summarize(failing, false).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);
    }
}
