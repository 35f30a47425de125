// Video catalog over a local directory

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use centroid_core::error::Result;
use centroid_core::port::VideoCatalog;

const VIDEO_EXTENSION: &str = "mp4";

/// Lists `.mp4` files (any case) directly inside the video root
pub struct DirectoryVideoCatalog {
    video_root: PathBuf,
}

impl DirectoryVideoCatalog {
    pub fn new(video_root: impl AsRef<Path>) -> Self {
        Self {
            video_root: video_root.as_ref().to_path_buf(),
        }
    }
}

fn is_video(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(VIDEO_EXTENSION))
}

#[async_trait]
impl VideoCatalog for DirectoryVideoCatalog {
    async fn list_videos(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.video_root).await?;
        let mut videos = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_video(name) {
                    videos.push(name.to_string());
                }
            }
        }

        videos.sort();
        Ok(videos)
    }
}
