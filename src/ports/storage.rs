use crate::error::StorageError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::PathBuf;
use std::pin::Pin;

/// Body of an incoming upload.
pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send + 'a>>;

/// A file written to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// Generated name inside the storage area
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
}

/// A stored file as handed to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaHandle {
    pub path: PathBuf,
    pub filename: String,
    pub mimetype: String,
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Stream an upload into storage under a freshly generated name
    async fn store<'a>(
        &self,
        original_name: &str,
        body: ByteStream<'a>,
    ) -> Result<StoredFile, StorageError>;

    /// Delete a stored file
    async fn remove(&self, filename: &str) -> Result<(), StorageError>;

    /// Handle for a previously stored file
    fn resolve(&self, filename: &str, mimetype: &str) -> Result<MediaHandle, StorageError>;
}
