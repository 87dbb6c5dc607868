//! Log tailing for a record's `log_path`

use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

const CHUNK_SIZE: u64 = 8 * 1024;

/// Return the last `lines` lines of the file at `path`.
///
/// Reads backwards in chunks so a large llama-server log is not loaded whole.
pub async fn tail_log(path: &Path, lines: usize) -> std::io::Result<Vec<String>> {
    if lines == 0 {
        return Ok(Vec::new());
    }

    let mut file = File::open(path).await?;
    let len = file.metadata().await?.len();

    let mut start = len;
    let mut buf: Vec<u8> = Vec::new();
    while start > 0 {
        let size = CHUNK_SIZE.min(start);
        start -= size;

        file.seek(SeekFrom::Start(start)).await?;
        let mut chunk = vec![0u8; size as usize];
        file.read_exact(&mut chunk).await?;
        chunk.extend_from_slice(&buf);
        buf = chunk;

        // one extra newline guarantees the first kept line is complete
        if buf.iter().filter(|&&b| b == b'\n').count() > lines {
            break;
        }
    }

    let text = String::from_utf8_lossy(&buf);
    let all: Vec<&str> = text.lines().collect();
    let skip = all.len().saturating_sub(lines);
    Ok(all[skip..].iter().map(|line| line.to_string()).collect())
}
