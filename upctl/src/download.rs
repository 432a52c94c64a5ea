//! Transient handle on a processed file returned by the service.
//!
//! A [`ProcessedFile`] plays the part of a revocable object URL: the response body is written to
//! a temporary file that exists exactly as long as the handle does.

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::NamedTempFile;
use url::Url;

use crate::errors::Result;
use crate::filename::processed_filename;

#[derive(Debug)]
pub struct ProcessedFile {
    filename: String,
    url: Url,
    len: usize,
    blob: NamedTempFile,
}

impl ProcessedFile {
    /// Store `body` in a transient blob named after `original_filename`.
    pub async fn create(original_filename: &str, body: Bytes) -> Result<Self> {
        let len = body.len();
        let blob = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            let mut blob = tempfile::Builder::new().prefix("upctl-").suffix(".blob").tempfile()?;
            blob.write_all(&body)?;
            blob.flush()?;
            Ok(blob)
        })
        .await
        .map_err(std::io::Error::other)??;

        let url = Url::from_file_path(blob.path()).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("temporary path {} cannot be expressed as a URL", blob.path().display()),
            )
        })?;

        let filename = processed_filename(original_filename);
        tracing::debug!(filename = %filename, size = len, url = %url, "Created processed file");

        Ok(Self {
            filename,
            url,
            len,
            blob,
        })
    }

    /// Suggested download name, e.g. `questions_processed.xlsx`.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// `file://` reference to the transient blob. Invalid once the handle is dropped.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &Path {
        self.blob.path()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub async fn bytes(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.path()).await?)
    }

    /// Persist a copy under the suggested filename inside `dir`, creating it if needed.
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        // Never let a service-influenced name escape the target directory
        let name = Path::new(&self.filename)
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "processed".into());
        let target = dir.join(name);

        tokio::fs::copy(self.path(), &target).await?;
        tracing::info!(path = %target.display(), size = self.len, "Saved processed file");
        Ok(target)
    }
}

impl Drop for ProcessedFile {
    fn drop(&mut self) {
        tracing::debug!(filename = %self.filename, url = %self.url, "Releasing processed file");
    }
}
