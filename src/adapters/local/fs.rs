use crate::error::StorageError;
use crate::ports::storage::{ByteStream, MediaHandle, MediaStorage, StoredFile};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

/// Stores uploads as plain files inside one directory.
#[derive(Clone, Debug)]
pub struct FsAdapter {
    upload_dir: PathBuf,
    max_file_size: u64,
}

impl FsAdapter {
    pub fn new(upload_dir: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_file_size,
        }
    }
}

#[async_trait]
impl MediaStorage for FsAdapter {
    async fn store<'a>(
        &self,
        original_name: &str,
        body: ByteStream<'a>,
    ) -> Result<StoredFile, StorageError> {
        let filename = generate_filename(original_name);
        let path = self.upload_dir.join(&filename);
        tokio::fs::create_dir_all(&self.upload_dir).await?;

        debug!("Saving upload {:?} to {:?}", original_name, path);

        // Read one byte past the limit so an oversized body is detectable.
        let mut body_reader = StreamReader::new(body).take(self.max_file_size.saturating_add(1));
        let mut file = BufWriter::new(File::create(&path).await?);

        let copied = match tokio::io::copy(&mut body_reader, &mut file).await {
            Ok(copied) => copied,
            Err(e) => {
                drop(file);
                remove_partial(&path).await;
                return Err(e.into());
            }
        };
        file.flush().await?;
        drop(file);

        if copied > self.max_file_size {
            remove_partial(&path).await;
            return Err(StorageError::TooLarge {
                limit: self.max_file_size,
            });
        }

        Ok(StoredFile {
            filename,
            path,
            size: copied,
        })
    }

    async fn remove(&self, filename: &str) -> Result<(), StorageError> {
        if !is_plain_file_name(filename) {
            return Err(StorageError::InvalidPath(filename.to_string()));
        }
        tokio::fs::remove_file(self.upload_dir.join(filename)).await?;
        Ok(())
    }

    fn resolve(&self, filename: &str, mimetype: &str) -> Result<MediaHandle, StorageError> {
        if !is_plain_file_name(filename) {
            return Err(StorageError::InvalidPath(filename.to_string()));
        }
        Ok(MediaHandle {
            path: self.upload_dir.join(filename),
            filename: filename.to_string(),
            mimetype: mimetype.to_string(),
        })
    }
}

/// `video-<unix millis>-<uuid><original extension>`
fn generate_filename(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    format!(
        "video-{}-{}{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple(),
        extension
    )
}

/// A single normal path component: no separators, no `..`, not absolute.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to remove partial upload {:?}: {}", path, e);
    }
}
