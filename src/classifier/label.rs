// Sentiment labels and per-label storage
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// The classifier's fixed three-class taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// All labels in display order
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ];

    /// Parse a label as reported by a model
    ///
    /// Accepts the label names in any case and the generic `LABEL_n`
    /// names, which follow the model's index order (positive, neutral,
    /// negative).
    pub fn from_model_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" | "pos" | "label_0" => Some(SentimentLabel::Positive),
            "neutral" | "neu" | "label_1" => Some(SentimentLabel::Neutral),
            "negative" | "neg" | "label_2" => Some(SentimentLabel::Negative),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One classifier output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: SentimentLabel,
    /// Confidence for `label`, in [0, 1]
    pub score: f32,
}

/// A value for each sentiment label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelMap<T> {
    pub positive: T,
    pub neutral: T,
    pub negative: T,
}

impl<T> LabelMap<T> {
    /// Build a map by evaluating `f` for every label
    pub fn from_fn(mut f: impl FnMut(SentimentLabel) -> T) -> Self {
        Self {
            positive: f(SentimentLabel::Positive),
            neutral: f(SentimentLabel::Neutral),
            negative: f(SentimentLabel::Negative),
        }
    }

    /// Iterate in display order
    pub fn iter(&self) -> impl Iterator<Item = (SentimentLabel, &T)> {
        SentimentLabel::ALL.into_iter().map(move |l| (l, &self[l]))
    }

    pub fn map<U>(&self, mut f: impl FnMut(SentimentLabel, &T) -> U) -> LabelMap<U> {
        LabelMap::from_fn(|l| f(l, &self[l]))
    }
}

impl<T> Index<SentimentLabel> for LabelMap<T> {
    type Output = T;

    fn index(&self, label: SentimentLabel) -> &T {
        match label {
            SentimentLabel::Positive => &self.positive,
            SentimentLabel::Neutral => &self.neutral,
            SentimentLabel::Negative => &self.negative,
        }
    }
}

impl<T> IndexMut<SentimentLabel> for LabelMap<T> {
    fn index_mut(&mut self, label: SentimentLabel) -> &mut T {
        match label {
            SentimentLabel::Positive => &mut self.positive,
            SentimentLabel::Neutral => &mut self.neutral,
            SentimentLabel::Negative => &mut self.negative,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_model_label() {
        assert_eq!(
            SentimentLabel::from_model_label("POSITIVE"),
            Some(SentimentLabel::Positive)
        );
        assert_eq!(
            SentimentLabel::from_model_label("LABEL_2"),
            Some(SentimentLabel::Negative)
        );
        assert_eq!(SentimentLabel::from_model_label("mixed"), None);
    }

    #[test]
    fn test_label_map_index() {
        let mut counts: LabelMap<usize> = LabelMap::default();
        counts[SentimentLabel::Neutral] += 2;
        counts[SentimentLabel::Negative] += 1;

        assert_eq!(counts.neutral, 2);
        let order: Vec<_> = counts.iter().map(|(l, c)| (l, *c)).collect();
        assert_eq!(
            order,
            vec![
                (SentimentLabel::Positive, 0),
                (SentimentLabel::Neutral, 2),
                (SentimentLabel::Negative, 1)
            ]
        );
    }

    #[test]
    fn test_label_map_serializes_by_name() {
        let map = LabelMap::from_fn(|l| l.as_str().len());
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["positive"], 8);
        assert_eq!(json["negative"], 8);
    }
}
