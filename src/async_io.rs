//! Import and export over tokio async streams.
//!
//! Parsing and encoding stay synchronous and in-memory; only the transfer of
//! the buffered bytes is async.

use std::path::Path;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::NbtError;
use crate::reader::Reader;
use crate::writer::{PrettyPrint, Writer};

impl Reader {
    /// Reads `reader` to the end, then imports it with format detection.
    ///
    /// With an input limit set, at most one byte past the limit is buffered.
    pub async fn import_async<R: AsyncRead + Unpin>(&mut self, mut reader: R) -> Result<(), NbtError> {
        let mut data = Vec::new();
        match self.limits().max_input_len {
            Some(limit) => {
                let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
                (&mut reader).take(cap).read_to_end(&mut data).await?;
            }
            None => {
                reader.read_to_end(&mut data).await?;
            }
        }
        self.import_bytes(&data)
    }

    pub async fn import_file_async(&mut self, path: impl AsRef<Path>) -> Result<(), NbtError> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        self.import_async(file).await?;
        self.set_file_path(path);
        Ok(())
    }
}

impl Writer {
    pub async fn export_bin_async<W: AsyncWrite + Unpin>(&self, mut writer: W) -> Result<(), NbtError> {
        let mut buf = BytesMut::new();
        self.export_bin(&mut buf)?;
        writer.write_all(&buf).await?;
        writer.flush().await?;
        Ok(())
    }

    pub async fn export_text_async<W: AsyncWrite + Unpin>(
        &self,
        mut writer: W,
        pretty: PrettyPrint,
    ) -> Result<(), NbtError> {
        let mut text = String::new();
        self.export_string(&mut text, pretty)?;
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}
