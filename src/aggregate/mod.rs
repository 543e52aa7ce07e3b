//! Aggregation of classified comments into an `AnalysisResult`

mod stats;

pub use stats::{median, percentile, round2, ScoreSummary};

use crate::classifier::{Classification, LabelMap, SentimentLabel};
use crate::normalize::NormalizedComment;
use crate::youtube::RawComment;
use ahash::{HashMap, HashMapExt};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A term and its occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// One classified comment on the time axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub published_at: DateTime<Utc>,
    pub label: SentimentLabel,
}

/// Label counts within one fixed-width time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub start: DateTime<Utc>,
    pub counts: LabelMap<usize>,
}

/// Everything a renderer needs about one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub video_id: String,
    pub model_name: String,
    pub analyzed_at: DateTime<Utc>,
    /// Comments returned by the fetch
    pub fetched: usize,
    /// Comments classified
    pub total: usize,
    /// Comments removed by the length rule
    pub dropped: usize,
    /// Comments lost to skipped model batches
    pub skipped: usize,
    pub counts: LabelMap<usize>,
    pub percentages: LabelMap<f64>,
    pub samples: LabelMap<Vec<String>>,
    pub term_frequencies: LabelMap<Vec<TermCount>>,
    /// Term frequencies across all labels
    pub overall_terms: Vec<TermCount>,
    pub score_distributions: LabelMap<Vec<f32>>,
    pub time_series: Vec<TimePoint>,
}

impl AnalysisResult {
    pub fn score_summary(&self, label: SentimentLabel) -> ScoreSummary {
        ScoreSummary::from_scores(&self.score_distributions[label])
    }

    /// Group the time series into windows of `hours`
    pub fn time_buckets(&self, hours: u32) -> Vec<TimeBucket> {
        bucket_time_series(&self.time_series, hours)
    }

    /// Label with the highest count; ties resolve in display order
    pub fn dominant_label(&self) -> Option<SentimentLabel> {
        if self.total == 0 {
            return None;
        }
        self.counts
            .iter()
            .fold(None, |best: Option<(SentimentLabel, usize)>, (label, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((label, count)),
            })
            .map(|(label, _)| label)
    }
}

/// Percentage per label, rounded to two decimals; all zero when total is 0
pub fn percentages(counts: &LabelMap<usize>) -> LabelMap<f64> {
    let total: usize = counts.iter().map(|(_, c)| *c).sum();
    if total == 0 {
        return LabelMap::default();
    }
    counts.map(|_, &c| round2(100.0 * c as f64 / total as f64))
}

/// Count whitespace-separated terms, most frequent first
///
/// Ties are ordered alphabetically so output is deterministic.
pub fn term_frequencies<'a, I>(texts: I, top: usize) -> Vec<TermCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut freq: HashMap<&'a str, usize> = HashMap::new();
    for text in texts {
        for term in text.split_whitespace() {
            *freq.entry(term).or_insert(0) += 1;
        }
    }

    let mut terms: Vec<TermCount> = freq
        .into_iter()
        .map(|(term, count)| TermCount {
            term: term.to_string(),
            count,
        })
        .collect();
    terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    terms.truncate(top);
    terms
}

/// Group time points into epoch-aligned windows of `hours`
///
/// Windows between the first and last populated window are included with
/// zero counts so the series has no gaps.
pub fn bucket_time_series(points: &[TimePoint], hours: u32) -> Vec<TimeBucket> {
    let width = i64::from(hours.max(1)) * 3600;
    let mut buckets: BTreeMap<i64, LabelMap<usize>> = BTreeMap::new();

    for point in points {
        let start = point.published_at.timestamp().div_euclid(width) * width;
        buckets.entry(start).or_default()[point.label] += 1;
    }

    let (first, last) = match (buckets.keys().next(), buckets.keys().next_back()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Vec::new(),
    };

    (0..=(last - first) / width)
        .filter_map(|i| {
            let start = first + i * width;
            let counts = buckets.get(&start).cloned().unwrap_or_default();
            Utc.timestamp_opt(start, 0)
                .single()
                .map(|start| TimeBucket { start, counts })
        })
        .collect()
}

/// Builds an `AnalysisResult` from classified comments
#[derive(Debug, Clone)]
pub struct Aggregator {
    sample_size: usize,
    top_terms: usize,
}

impl Aggregator {
    pub fn new(sample_size: usize, top_terms: usize) -> Self {
        Self {
            sample_size,
            top_terms,
        }
    }

    /// Aggregate one run
    ///
    /// `raw` is the fetched list the comments' `source_index` refers to;
    /// samples carry the original comment text.
    pub fn aggregate(
        &self,
        video_id: &str,
        model_name: &str,
        raw: &[RawComment],
        classified: &[(NormalizedComment, Classification)],
        dropped: usize,
        skipped: usize,
    ) -> AnalysisResult {
        let mut counts: LabelMap<usize> = LabelMap::default();
        let mut samples: LabelMap<Vec<String>> = LabelMap::default();
        let mut score_distributions: LabelMap<Vec<f32>> = LabelMap::default();
        let mut visual_texts: LabelMap<Vec<&str>> = LabelMap::default();
        let mut time_series = Vec::with_capacity(classified.len());

        for (comment, classification) in classified {
            let label = classification.label;
            counts[label] += 1;

            if samples[label].len() < self.sample_size {
                let text = raw
                    .get(comment.source_index)
                    .map(|r| r.text.clone())
                    .unwrap_or_else(|| comment.model_text.clone());
                samples[label].push(text);
            }

            score_distributions[label].push(classification.score);
            visual_texts[label].push(comment.visual_text.as_str());
            time_series.push(TimePoint {
                published_at: comment.published_at,
                label,
            });
        }

        let per_label_terms =
            visual_texts.map(|_, texts| term_frequencies(texts.iter().copied(), self.top_terms));
        let overall_terms = term_frequencies(
            classified.iter().map(|(c, _)| c.visual_text.as_str()),
            self.top_terms,
        );

        AnalysisResult {
            video_id: video_id.to_string(),
            model_name: model_name.to_string(),
            analyzed_at: Utc::now(),
            fetched: raw.len(),
            total: classified.len(),
            dropped,
            skipped,
            percentages: percentages(&counts),
            counts,
            samples,
            term_frequencies: per_label_terms,
            overall_terms,
            score_distributions,
            time_series,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(5, 50)
    }
}
