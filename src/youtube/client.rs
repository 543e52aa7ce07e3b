/// HTTP client for the video platform Data API
use super::types::{
    ApiErrorResponse, CommentPage, CommentThreadListResponse, VideoListResponse, VideoRef,
};
use super::{CommentSource, VideoSource};
use crate::config::YoutubeConfig;
use crate::error::{Result, TubesentError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const QUOTA_REASONS: [&str; 3] = ["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"];

/// Data API client holding the injected API key
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    /// Create a client for `base_url` authenticating with `api_key`
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TubesentError::Config("API key cannot be empty".to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Create a client from configuration and an already-resolved key
    pub fn from_config(config: &YoutubeConfig, api_key: impl Into<String>) -> Result<Self> {
        Self::new(
            api_key,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        video_id: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, resource);
        let start = std::time::Instant::now();

        let resp = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| TubesentError::Remote(format!("Request to {} failed: {}", resource, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &body, video_id));
        }

        let parsed = resp.json::<T>().await.map_err(|e| {
            TubesentError::Remote(format!("Decoding {} response failed: {}", resource, e))
        })?;

        debug!(
            "GET {} completed - status={}, duration={:.2}s",
            resource,
            status,
            start.elapsed().as_secs_f32()
        );

        Ok(parsed)
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn video_info(&self, video_id: &str) -> Result<VideoRef> {
        let resp: VideoListResponse = self
            .get_json(
                "videos",
                video_id,
                &[("part", "snippet".to_string()), ("id", video_id.to_string())],
            )
            .await?;

        let item = resp
            .items
            .into_iter()
            .next()
            .ok_or_else(|| TubesentError::NotFound {
                id: video_id.to_string(),
            })?;

        Ok(VideoRef {
            id: video_id.to_string(),
            title: item.snippet.title,
            thumbnail_url: item.snippet.thumbnails.best_url(video_id),
        })
    }
}

#[async_trait]
impl CommentSource for YouTubeClient {
    async fn comment_page(
        &self,
        video_id: &str,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<CommentPage> {
        let mut query = vec![
            ("part", "snippet".to_string()),
            ("videoId", video_id.to_string()),
            ("maxResults", page_size.to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let resp: CommentThreadListResponse = self
            .get_json("commentThreads", video_id, &query)
            .await?;
        Ok(CommentPage::from(resp))
    }
}

/// Map an error response onto the pipeline's error kinds
///
/// Quota exhaustion is reported by reason code; bodies that are not the
/// API's JSON error envelope are matched as plain text. `video_id` names
/// the video the request was about.
pub fn classify_api_error(status: StatusCode, body: &str, video_id: &str) -> TubesentError {
    let (message, reasons) = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => (
            parsed.error.message,
            parsed
                .error
                .errors
                .into_iter()
                .map(|e| e.reason)
                .collect::<Vec<_>>(),
        ),
        Err(_) => (body.trim().to_string(), Vec::new()),
    };

    let has_reason = |wanted: &str| {
        reasons.iter().any(|r| r == wanted) || (reasons.is_empty() && message.contains(wanted))
    };

    if QUOTA_REASONS.into_iter().any(has_reason) {
        return TubesentError::QuotaExceeded(message);
    }
    if has_reason("commentsDisabled") {
        return TubesentError::EmptyResult("comments are disabled for this video".to_string());
    }
    if has_reason("videoNotFound") || status == StatusCode::NOT_FOUND {
        debug!("Video {} not found: {}", video_id, message);
        return TubesentError::NotFound {
            id: video_id.to_string(),
        };
    }

    TubesentError::Remote(format!("HTTP {}: {}", status.as_u16(), message))
}
