/// Paginated comment fetching
use super::{CommentSource, RawComment};
use crate::config::{MAX_COMMENTS, MIN_COMMENTS};
use crate::error::Result;
use crate::progress::{ProgressSink, Stage};
use tracing::{debug, info, warn};

/// Page size cap imposed by the listing endpoint
pub const PAGE_SIZE: usize = 100;

/// Clamp a requested comment count into the supported range
///
/// Large requests are allowed but logged, since they cost quota and time.
pub fn clamp_max_comments(requested: usize) -> usize {
    let max = requested.clamp(MIN_COMMENTS, MAX_COMMENTS);
    if max != requested {
        warn!(
            "Requested {} comments, clamped to {} (allowed range {}-{})",
            requested, max, MIN_COMMENTS, MAX_COMMENTS
        );
    }

    if max > 3000 {
        warn!(
            "Fetching {} comments takes several minutes and uses a large share of the daily API quota",
            max
        );
    } else if max > 1500 {
        warn!("Fetching {} comments is slow and consumes quota quickly", max);
    }

    max
}

/// Accumulates comments page by page until the cap or the last page
pub struct CommentFetcher<'a, S: CommentSource + ?Sized> {
    source: &'a S,
    page_size: usize,
}

impl<'a, S: CommentSource + ?Sized> CommentFetcher<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            page_size: PAGE_SIZE,
        }
    }

    /// Fetch up to `max_comments` comments in pagination order
    ///
    /// The first failing page aborts the fetch; comments from earlier pages
    /// are dropped with it.
    pub async fn fetch(
        &self,
        video_id: &str,
        max_comments: usize,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<RawComment>> {
        let start = std::time::Instant::now();
        let mut comments: Vec<RawComment> = Vec::with_capacity(max_comments.min(MAX_COMMENTS));
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        while comments.len() < max_comments {
            let page = self
                .source
                .comment_page(video_id, page_token.as_deref(), self.page_size)
                .await?;
            pages += 1;

            let remaining = max_comments - comments.len();
            comments.extend(page.comments.into_iter().take(remaining));

            debug!(
                "Fetched page {} - video={}, total_so_far={}",
                pages,
                video_id,
                comments.len()
            );
            progress.on_progress(Stage::Fetch, comments.len(), max_comments);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(
            "Comment fetch completed - video={}, comments={}, pages={}, duration={:.2}s",
            video_id,
            comments.len(),
            pages,
            start.elapsed().as_secs_f32()
        );

        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TubesentError;
    use crate::progress::NoopProgress;
    use crate::youtube::CommentPage;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `total` comments in pages, optionally failing on one page
    struct PagedSource {
        total: usize,
        fail_on_page: Option<usize>,
        calls: AtomicUsize,
    }

    impl PagedSource {
        fn new(total: usize) -> Self {
            Self {
                total,
                fail_on_page: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CommentSource for PagedSource {
        async fn comment_page(
            &self,
            _video_id: &str,
            page_token: Option<&str>,
            page_size: usize,
        ) -> Result<CommentPage> {
            let page_no = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_page == Some(page_no) {
                return Err(TubesentError::QuotaExceeded("quotaExceeded".to_string()));
            }

            let offset: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let end = (offset + page_size).min(self.total);
            let comments = (offset..end)
                .map(|i| RawComment {
                    text: format!("comment number {}", i),
                    published_at: Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
                })
                .collect();
            let next_page_token = (end < self.total).then(|| end.to_string());

            Ok(CommentPage {
                comments,
                next_page_token,
            })
        }
    }

    #[test]
    fn test_clamp_max_comments() {
        assert_eq!(clamp_max_comments(10), 100);
        assert_eq!(clamp_max_comments(250), 250);
        assert_eq!(clamp_max_comments(9000), 5000);
    }

    #[tokio::test]
    async fn test_stops_at_cap() {
        let source = PagedSource::new(1000);
        let comments = CommentFetcher::new(&source)
            .fetch("vid", 250, &NoopProgress)
            .await
            .unwrap();

        assert_eq!(comments.len(), 250);
        assert_eq!(comments[249].text, "comment number 249");
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_when_pages_run_out() {
        let source = PagedSource::new(180);
        let comments = CommentFetcher::new(&source)
            .fetch("vid", 250, &NoopProgress)
            .await
            .unwrap();

        assert_eq!(comments.len(), 180);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_discards_partial_pages() {
        let mut source = PagedSource::new(1000);
        source.fail_on_page = Some(2);

        let result = CommentFetcher::new(&source)
            .fetch("vid", 500, &NoopProgress)
            .await;

        assert!(matches!(result, Err(TubesentError::QuotaExceeded(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_video() {
        let source = PagedSource::new(0);
        let comments = CommentFetcher::new(&source)
            .fetch("vid", 100, &NoopProgress)
            .await
            .unwrap();
        assert!(comments.is_empty());
    }
}
