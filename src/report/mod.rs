//! Report rendering for a cached analysis
//!
//! Markdown is meant for reading; JSON carries the full result plus
//! derived summaries for downstream tooling.

use crate::aggregate::{AnalysisResult, ScoreSummary, TimeBucket};
use crate::classifier::{LabelMap, SentimentLabel};
use crate::error::{Result, TubesentError};
use crate::youtube::VideoRef;
use serde::Serialize;
use std::fmt::Write;
use std::str::FromStr;

/// Terms listed per label in the markdown report
const MARKDOWN_TERMS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Markdown,
    Json,
}

impl FromStr for ReportFormat {
    type Err = TubesentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            other => Err(TubesentError::InvalidConfigValue {
                path: "report.format".to_string(),
                message: format!("Unsupported report format '{}'", other),
            }),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    video: &'a VideoRef,
    dominant_label: Option<SentimentLabel>,
    score_summaries: LabelMap<ScoreSummary>,
    timeline: Vec<TimeBucket>,
    result: &'a AnalysisResult,
}

/// Render a report for a video and its analysis
pub fn render(
    video: &VideoRef,
    result: &AnalysisResult,
    format: ReportFormat,
    bucket_hours: u32,
) -> Result<String> {
    match format {
        ReportFormat::Json => {
            let report = JsonReport {
                video,
                dominant_label: result.dominant_label(),
                score_summaries: LabelMap::from_fn(|l| result.score_summary(l)),
                timeline: result.time_buckets(bucket_hours),
                result,
            };
            serde_json::to_string_pretty(&report).map_err(|e| TubesentError::Json {
                source: e,
                context: "Failed to serialize report".to_string(),
            })
        }
        ReportFormat::Markdown => {
            let mut out = String::new();
            write_markdown(&mut out, video, result, bucket_hours)
                .map_err(|e| TubesentError::Other(e.into()))?;
            Ok(out)
        }
    }
}

fn write_markdown(
    out: &mut String,
    video: &VideoRef,
    result: &AnalysisResult,
    bucket_hours: u32,
) -> std::fmt::Result {
    writeln!(out, "# Comment sentiment: {}", video.title)?;
    writeln!(out)?;
    writeln!(out, "![thumbnail]({})", video.thumbnail_url)?;
    writeln!(out)?;
    writeln!(out, "- Video: https://www.youtube.com/watch?v={}", video.id)?;
    writeln!(out, "- Model: `{}`", result.model_name)?;
    writeln!(
        out,
        "- Analyzed at: {}",
        result.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(
        out,
        "- Comments: {} fetched, {} classified, {} too short, {} skipped",
        result.fetched, result.total, result.dropped, result.skipped
    )?;
    if let Some(label) = result.dominant_label() {
        writeln!(out, "- Dominant sentiment: **{}**", label)?;
    }
    writeln!(out)?;

    writeln!(out, "## Distribution")?;
    writeln!(out)?;
    writeln!(out, "| Label | Count | Percent | Mean score | Median score |")?;
    writeln!(out, "|-------|------:|--------:|-----------:|-------------:|")?;
    for (label, count) in result.counts.iter() {
        let summary = result.score_summary(label);
        writeln!(
            out,
            "| {} | {} | {:.2}% | {:.3} | {:.3} |",
            label, count, result.percentages[label], summary.mean, summary.median
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Sample comments")?;
    for (label, samples) in result.samples.iter() {
        writeln!(out)?;
        writeln!(out, "### {}", label)?;
        writeln!(out)?;
        if samples.is_empty() {
            writeln!(out, "_none_")?;
        }
        for sample in samples {
            writeln!(out, "> {}", sample.replace('\n', " "))?;
            writeln!(out)?;
        }
    }
    writeln!(out)?;

    writeln!(out, "## Top terms")?;
    writeln!(out)?;
    for (label, terms) in result.term_frequencies.iter() {
        let listed: Vec<String> = terms
            .iter()
            .take(MARKDOWN_TERMS)
            .map(|t| format!("{} ({})", t.term, t.count))
            .collect();
        let listed = if listed.is_empty() {
            "_none_".to_string()
        } else {
            listed.join(", ")
        };
        writeln!(out, "- **{}**: {}", label, listed)?;
    }
    writeln!(out)?;

    let buckets = result.time_buckets(bucket_hours);
    if !buckets.is_empty() {
        writeln!(out, "## Timeline ({}h windows)", bucket_hours)?;
        writeln!(out)?;
        writeln!(out, "| Window start | Positive | Neutral | Negative |")?;
        writeln!(out, "|--------------|---------:|--------:|---------:|")?;
        for bucket in &buckets {
            writeln!(
                out,
                "| {} | {} | {} | {} |",
                bucket.start.format("%Y-%m-%d %H:%M"),
                bucket.counts.positive,
                bucket.counts.neutral,
                bucket.counts.negative
            )?;
        }
    }

    Ok(())
}
