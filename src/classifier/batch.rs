/// Batched classification of normalized comments
use super::{Classification, SentimentModel};
use crate::error::{Result, TubesentError};
use crate::normalize::NormalizedComment;
use crate::progress::{ProgressSink, Stage};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Batch size used by the pipeline
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// What to do when the model fails on one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchErrorPolicy {
    /// Fail the whole run
    #[default]
    Abort,
    /// Drop the batch, count it as skipped and continue
    Skip,
}

impl FromStr for BatchErrorPolicy {
    type Err = TubesentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(BatchErrorPolicy::Abort),
            "skip" => Ok(BatchErrorPolicy::Skip),
            other => Err(TubesentError::InvalidConfigValue {
                path: "model.on_batch_error".to_string(),
                message: format!("Expected 'abort' or 'skip', got '{}'", other),
            }),
        }
    }
}

/// Output of classifying a set of comments
#[derive(Debug, Default)]
pub struct ClassifyOutput {
    /// Comments with their classification, in input order
    pub classified: Vec<(NormalizedComment, Classification)>,
    /// Comments lost to skipped batches
    pub skipped: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub duration_ms: u64,
}

/// Splits comments into fixed-size batches and runs them through the model
pub struct BatchClassifier {
    model: Arc<dyn SentimentModel>,
    batch_size: usize,
    policy: BatchErrorPolicy,
}

impl BatchClassifier {
    /// Create a new batch classifier
    ///
    /// # Arguments
    /// * `model` - Shared model handle
    /// * `batch_size` - Number of texts per model call
    /// * `policy` - Behaviour when a batch fails
    pub fn new(model: Arc<dyn SentimentModel>, batch_size: usize, policy: BatchErrorPolicy) -> Self {
        Self {
            model,
            batch_size: batch_size.max(1),
            policy,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Classify all comments sequentially, one batch at a time
    pub async fn classify(
        &self,
        comments: Vec<NormalizedComment>,
        progress: &dyn ProgressSink,
    ) -> Result<ClassifyOutput> {
        let start = std::time::Instant::now();
        let total = comments.len();

        info!(
            "Classifying {} comments with {} (batch_size={})",
            total,
            self.model.model_name(),
            self.batch_size
        );

        let mut output = ClassifyOutput {
            classified: Vec::with_capacity(total),
            ..Default::default()
        };
        let mut done = 0usize;
        let mut remaining = comments.into_iter();

        loop {
            let batch: Vec<NormalizedComment> = remaining.by_ref().take(self.batch_size).collect();
            if batch.is_empty() {
                break;
            }
            output.batches += 1;
            done += batch.len();

            let texts: Vec<String> = batch.iter().map(|c| c.model_text.clone()).collect();
            match self.classify_chunk(&texts).await {
                Ok(results) => {
                    debug!("Classified batch {} of {} items", output.batches, batch.len());
                    output.classified.extend(batch.into_iter().zip(results));
                }
                Err(e) => match self.policy {
                    BatchErrorPolicy::Abort => {
                        warn!("Batch {} failed, aborting run: {}", output.batches, e);
                        return Err(e);
                    }
                    BatchErrorPolicy::Skip => {
                        warn!(
                            "Batch {} failed, skipping {} comments: {}",
                            output.batches,
                            batch.len(),
                            e
                        );
                        output.failed_batches += 1;
                        output.skipped += batch.len();
                    }
                },
            }

            progress.on_progress(Stage::Classify, done, total);
        }

        output.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Classification complete: {} classified, {} skipped, {} batches, {}ms",
            output.classified.len(),
            output.skipped,
            output.batches,
            output.duration_ms
        );

        Ok(output)
    }

    async fn classify_chunk(&self, texts: &[String]) -> Result<Vec<Classification>> {
        let results = self.model.classify_batch(texts).await?;

        if results.len() != texts.len() {
            return Err(TubesentError::Model(format!(
                "Result count mismatch: expected {}, got {}",
                texts.len(),
                results.len()
            )));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ModelError, SentimentLabel};
    use crate::progress::NoopProgress;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Labels by keyword; fails on the configured call number
    struct KeywordModel {
        fail_on_call: Option<usize>,
        calls: AtomicUsize,
        batch_sizes: Mutex<Vec<usize>>,
    }

    impl KeywordModel {
        fn new(fail_on_call: Option<usize>) -> Self {
            Self {
                fail_on_call,
                calls: AtomicUsize::new(0),
                batch_sizes: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SentimentModel for KeywordModel {
        async fn classify_batch(
            &self,
            texts: &[String],
        ) -> std::result::Result<Vec<Classification>, ModelError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.batch_sizes.lock().unwrap().push(texts.len());
            if self.fail_on_call == Some(call) {
                return Err(ModelError::RequestError("HTTP 503: loading".to_string()));
            }

            Ok(texts
                .iter()
                .map(|t| Classification {
                    label: if t.contains("bagus") {
                        SentimentLabel::Positive
                    } else {
                        SentimentLabel::Negative
                    },
                    score: 0.9,
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "keyword-test"
        }
    }

    fn comments(n: usize) -> Vec<NormalizedComment> {
        (0..n)
            .map(|i| NormalizedComment {
                model_text: if i % 2 == 0 {
                    format!("videonya bagus {}", i)
                } else {
                    format!("videonya jelek {}", i)
                },
                visual_text: String::new(),
                published_at: Utc::now(),
                source_index: i,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_batches_of_fixed_size() {
        let model = Arc::new(KeywordModel::new(None));
        let classifier = BatchClassifier::new(model.clone(), 64, BatchErrorPolicy::Abort);

        let output = classifier.classify(comments(150), &NoopProgress).await.unwrap();

        assert_eq!(output.classified.len(), 150);
        assert_eq!(output.batches, 3);
        assert_eq!(*model.batch_sizes.lock().unwrap(), vec![64, 64, 22]);
        assert_eq!(output.classified[0].1.label, SentimentLabel::Positive);
        assert_eq!(output.classified[1].1.label, SentimentLabel::Negative);
        assert_eq!(output.classified[149].0.source_index, 149);
    }

    #[tokio::test]
    async fn test_abort_policy_fails_run() {
        let model = Arc::new(KeywordModel::new(Some(1)));
        let classifier = BatchClassifier::new(model.clone(), 64, BatchErrorPolicy::Abort);

        let result = classifier.classify(comments(150), &NoopProgress).await;

        assert!(matches!(result, Err(TubesentError::Model(_))));
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_skip_policy_continues() {
        let model = Arc::new(KeywordModel::new(Some(1)));
        let classifier = BatchClassifier::new(model.clone(), 64, BatchErrorPolicy::Skip);

        let output = classifier.classify(comments(150), &NoopProgress).await.unwrap();

        assert_eq!(output.classified.len(), 86);
        assert_eq!(output.skipped, 64);
        assert_eq!(output.failed_batches, 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let model = Arc::new(KeywordModel::new(None));
        let classifier = BatchClassifier::new(model.clone(), 64, BatchErrorPolicy::Abort);

        let output = classifier.classify(Vec::new(), &NoopProgress).await.unwrap();
        assert!(output.classified.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Skip".parse::<BatchErrorPolicy>().unwrap(), BatchErrorPolicy::Skip);
        assert!("retry".parse::<BatchErrorPolicy>().is_err());
    }
}
