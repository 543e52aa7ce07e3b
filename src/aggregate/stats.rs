// Numeric helpers for aggregation
use serde::{Deserialize, Serialize};

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Calculate percentile value from sorted or unsorted scores
/// p should be between 0.0 (min) and 1.0 (max)
pub fn percentile(scores: &[f32], p: f32) -> f32 {
    if scores.is_empty() {
        return 0.0;
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let index = ((sorted.len() as f32) * p) as usize;
    let index = index.min(sorted.len() - 1);

    sorted[index]
}

/// Median of the scores, averaging the two middle values for even lengths
pub fn median(scores: &[f32]) -> f32 {
    if scores.is_empty() {
        return 0.0;
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Summary of one label's confidence scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f32,
    pub median: f32,
    pub p90: f32,
    pub min: f32,
    pub max: f32,
}

impl ScoreSummary {
    pub fn from_scores(scores: &[f32]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }

        let sum: f32 = scores.iter().sum();
        Self {
            count: scores.len(),
            mean: sum / scores.len() as f32,
            median: median(scores),
            p90: percentile(scores, 0.9),
            min: scores.iter().copied().fold(f32::INFINITY, f32::min),
            max: scores.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_basic() {
        let scores = vec![1.0, 2.0, 3.0, 4.0, 5.0];

        assert_eq!(percentile(&scores, 0.0), 1.0);
        assert_eq!(percentile(&scores, 0.5), 3.0);
        assert_eq!(percentile(&scores, 1.0), 5.0);
    }

    #[test]
    fn test_percentile_empty() {
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_median_even_length() {
        assert!((median(&[0.9, 0.5]) - 0.7).abs() < 1e-6);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[0.3]), 0.3);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
    }

    #[test]
    fn test_score_summary() {
        let summary = ScoreSummary::from_scores(&[0.5, 0.9, 0.7]);
        assert_eq!(summary.count, 3);
        assert!((summary.mean - 0.7).abs() < 1e-6);
        assert_eq!(summary.median, 0.7);
        assert_eq!(summary.min, 0.5);
        assert_eq!(summary.max, 0.9);

        assert_eq!(ScoreSummary::from_scores(&[]), ScoreSummary::default());

        let even = ScoreSummary::from_scores(&[0.5, 0.9]);
        assert!((even.median - 0.7).abs() < 1e-6);
    }
}
