//! Analysis pipeline
//!
//! Runs find → fetch → normalize → classify → aggregate against an
//! `AnalysisSession`. Every stage is awaited before the next one starts.

use crate::aggregate::{AnalysisResult, Aggregator};
use crate::classifier::{BatchClassifier, SentimentModel};
use crate::config::Config;
use crate::error::{Result, TubesentError};
use crate::extract::extract_video_id;
use crate::normalize::TextNormalizer;
use crate::progress::ProgressSink;
use crate::session::{AnalysisSession, SessionStore};
use crate::youtube::{clamp_max_comments, CommentFetcher, CommentSource, VideoRef, VideoSource};
use std::sync::Arc;
use tracing::{info, warn};

/// Counts from one successful analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub fetched: usize,
    pub dropped: usize,
    pub classified: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

/// Wires the remote sources, normalizer, classifier and aggregator together
pub struct Pipeline {
    videos: Arc<dyn VideoSource>,
    comments: Arc<dyn CommentSource>,
    normalizer: TextNormalizer,
    classifier: BatchClassifier,
    aggregator: Aggregator,
}

impl Pipeline {
    /// Create a new pipeline
    ///
    /// # Arguments
    /// * `videos` - Metadata lookup backend
    /// * `comments` - Comment listing backend
    /// * `normalizer` - Text cleaning with the configured stopwords
    /// * `classifier` - Batched sentiment classification
    /// * `aggregator` - Result summarization
    pub fn new(
        videos: Arc<dyn VideoSource>,
        comments: Arc<dyn CommentSource>,
        normalizer: TextNormalizer,
        classifier: BatchClassifier,
        aggregator: Aggregator,
    ) -> Self {
        Self {
            videos,
            comments,
            normalizer,
            classifier,
            aggregator,
        }
    }

    /// Build a pipeline from configuration around already-constructed backends
    pub fn from_config<S>(config: &Config, source: Arc<S>, model: Arc<dyn SentimentModel>) -> Self
    where
        S: VideoSource + CommentSource + 'static,
    {
        Self::new(
            source.clone(),
            source,
            TextNormalizer::with_extra_stopwords(&config.normalize.extra_stopwords),
            BatchClassifier::new(model, config.model.batch_size, config.model.on_batch_error),
            Aggregator::new(config.aggregate.sample_size, config.aggregate.top_terms),
        )
    }

    /// Resolve user input to a video and select it in the session
    ///
    /// The session is left untouched when extraction or lookup fails.
    pub async fn find_video(&self, session: &mut AnalysisSession, input: &str) -> Result<VideoRef> {
        session.ensure_can_select_video()?;

        let video_id = extract_video_id(input)?;
        let video = self.videos.video_info(&video_id).await?;

        info!("Found video {}: {}", video.id, video.title);
        session.set_video(video.clone())?;
        Ok(video)
    }

    /// Analyze the session's video and cache the result in the session
    ///
    /// On failure the session returns to the video-found state with
    /// nothing cached.
    pub async fn analyze(
        &self,
        session: &mut AnalysisSession,
        max_comments: usize,
        progress: &dyn ProgressSink,
    ) -> Result<RunStats> {
        let video = session.begin_analysis()?;
        self.complete(session, &video, max_comments, progress).await
    }

    /// Analyze like `analyze`, saving the session to `store` as the run
    /// starts and again when it ends
    ///
    /// While the run is in flight the stored session is Analyzing, so other
    /// processes sharing the store cannot start a second analysis or select
    /// another video.
    pub async fn analyze_persisted(
        &self,
        store: &SessionStore,
        session: &mut AnalysisSession,
        max_comments: usize,
        progress: &dyn ProgressSink,
    ) -> Result<RunStats> {
        let video = store.begin_analysis(session)?;
        let outcome = self.complete(session, &video, max_comments, progress).await;
        store.save(session)?;
        outcome
    }

    async fn complete(
        &self,
        session: &mut AnalysisSession,
        video: &VideoRef,
        max_comments: usize,
        progress: &dyn ProgressSink,
    ) -> Result<RunStats> {
        match self.run(video, max_comments, progress).await {
            Ok((result, stats)) => {
                session.finish_analysis(result)?;
                Ok(stats)
            }
            Err(e) => {
                warn!("Analysis of {} failed: {}", video.id, e);
                session.abort_analysis();
                Err(e)
            }
        }
    }

    /// Discard the session's video and result
    pub fn reset(&self, session: &mut AnalysisSession) {
        session.reset();
    }

    async fn run(
        &self,
        video: &VideoRef,
        max_comments: usize,
        progress: &dyn ProgressSink,
    ) -> Result<(AnalysisResult, RunStats)> {
        let start = std::time::Instant::now();
        let max_comments = clamp_max_comments(max_comments);

        let raw = CommentFetcher::new(self.comments.as_ref())
            .fetch(&video.id, max_comments, progress)
            .await?;
        if raw.is_empty() {
            return Err(TubesentError::EmptyResult(format!(
                "video {} has no comments",
                video.id
            )));
        }

        let normalized = self.normalizer.normalize_all(&raw);
        if normalized.comments.is_empty() {
            return Err(TubesentError::EmptyResult(format!(
                "all {} comments were too short after cleaning",
                raw.len()
            )));
        }
        let dropped = normalized.dropped;

        let output = self.classifier.classify(normalized.comments, progress).await?;
        if output.classified.is_empty() {
            return Err(TubesentError::EmptyResult(format!(
                "every model batch failed ({} comments skipped)",
                output.skipped
            )));
        }

        let result = self.aggregator.aggregate(
            &video.id,
            self.classifier.model_name(),
            &raw,
            &output.classified,
            dropped,
            output.skipped,
        );

        let stats = RunStats {
            fetched: raw.len(),
            dropped,
            classified: output.classified.len(),
            skipped: output.skipped,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Analysis complete - video={}, fetched={}, dropped={}, classified={}, skipped={}, duration={}ms",
            video.id,
            stats.fetched,
            stats.dropped,
            stats.classified,
            stats.skipped,
            stats.duration_ms
        );

        Ok((result, stats))
    }
}
