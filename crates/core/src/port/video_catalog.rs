// Video Catalog Port

use crate::error::Result;
use async_trait::async_trait;

/// Lists the videos that can be submitted for processing
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    /// File names (not paths) of the available videos
    async fn list_videos(&self) -> Result<Vec<String>>;
}
