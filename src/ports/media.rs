use async_trait::async_trait;
use std::path::Path;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Duration of the media in seconds, `None` if it cannot be determined
    async fn duration(&self, path: &Path) -> Option<f64>;
}
