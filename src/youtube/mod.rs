//! Video platform access: metadata lookup and paginated comment fetching
//!
//! Remote access sits behind the `VideoSource` and `CommentSource` traits so
//! the pagination logic and the pipeline can run against any backend.

mod client;
mod fetcher;
mod types;

pub use client::{classify_api_error, YouTubeClient};
pub use fetcher::{clamp_max_comments, CommentFetcher, PAGE_SIZE};
pub use types::{CommentPage, RawComment, VideoRef};

use crate::error::Result;
use async_trait::async_trait;

/// Source of video metadata
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Look up title and thumbnail for a video identifier
    async fn video_info(&self, video_id: &str) -> Result<VideoRef>;
}

/// Source of top-level comment pages
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Fetch one page of comments, starting at `page_token` when given
    async fn comment_page(
        &self,
        video_id: &str,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<CommentPage>;
}
