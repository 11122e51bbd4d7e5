use std::fmt;
use std::io;
use std::path::Path;

use base64::Engine;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Raw 128-bit MD5 digest of a blob.
///
/// Displays as the base64 of the 16 raw bytes, which is the form clients
/// expect in the `Content-MD5` header. Use [`ContentMd5::to_hex`] for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentMd5([u8; 16]);

impl ContentMd5 {
    pub fn of(data: &[u8]) -> Self {
        Self(md5::compute(data).0)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentMd5 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

/// Digest everything `reader` yields, reading at most `chunk_size` bytes at a time.
pub async fn digest_reader<R>(mut reader: R, chunk_size: usize) -> io::Result<ContentMd5>
where
    R: AsyncRead + Unpin,
{
    let mut context = md5::Context::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        context.consume(&buf[..n]);
    }
    Ok(ContentMd5(context.compute().0))
}

pub async fn digest_file(path: &Path, chunk_size: usize) -> io::Result<ContentMd5> {
    let file = tokio::fs::File::open(path).await?;
    digest_reader(file, chunk_size).await
}
