// Domain types and wire payloads for the video platform Data API
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for the video under analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRef {
    /// 11-character platform identifier
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
}

/// A top-level comment as returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawComment {
    pub text: String,
    pub published_at: DateTime<Utc>,
}

/// One page of the comment listing
#[derive(Debug, Clone, Default)]
pub struct CommentPage {
    pub comments: Vec<RawComment>,
    /// Absent on the last page
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VideoItem {
    pub snippet: VideoSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VideoSnippet {
    pub title: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Thumbnails {
    pub maxres: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Thumbnail {
    pub url: String,
}

impl Thumbnails {
    /// Best available thumbnail, falling back to the static image URL
    pub fn best_url(&self, video_id: &str) -> String {
        [&self.maxres, &self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .map(|t| t.url.clone())
            .find(|url| !url.is_empty())
            .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", video_id))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentThreadListResponse {
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub items: Vec<CommentThread>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommentThread {
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentThreadSnippet {
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TopLevelComment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentSnippet {
    pub text_display: String,
    pub published_at: DateTime<Utc>,
}

impl From<CommentThreadListResponse> for CommentPage {
    fn from(resp: CommentThreadListResponse) -> Self {
        Self {
            comments: resp
                .items
                .into_iter()
                .map(|item| {
                    let snippet = item.snippet.top_level_comment.snippet;
                    RawComment {
                        text: snippet.text_display,
                        published_at: snippet.published_at,
                    }
                })
                .collect(),
            next_page_token: resp.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_preference() {
        let json = r#"{
            "default": {"url": "d.jpg"},
            "medium": {"url": "m.jpg"},
            "high": {"url": "h.jpg"}
        }"#;
        let thumbs: Thumbnails = serde_json::from_str(json).unwrap();
        assert_eq!(thumbs.best_url("abc"), "h.jpg");

        let json = r#"{"maxres": {"url": "x.jpg"}, "high": {"url": "h.jpg"}}"#;
        let thumbs: Thumbnails = serde_json::from_str(json).unwrap();
        assert_eq!(thumbs.best_url("abc"), "x.jpg");
    }

    #[test]
    fn test_thumbnail_fallback() {
        let thumbs = Thumbnails::default();
        assert_eq!(
            thumbs.best_url("dQw4w9WgXcQ"),
            "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        );
    }

    #[test]
    fn test_comment_page_from_response() {
        let json = r#"{
            "kind": "youtube#commentThreadListResponse",
            "nextPageToken": "QURTSl9p",
            "items": [
                {"snippet": {"topLevelComment": {"snippet": {
                    "textDisplay": "mantap<br>keren",
                    "publishedAt": "2024-03-01T10:15:00Z"
                }}}},
                {"snippet": {"topLevelComment": {"snippet": {
                    "textDisplay": "biasa aja",
                    "publishedAt": "2024-03-01T11:00:00Z"
                }}}}
            ]
        }"#;
        let resp: CommentThreadListResponse = serde_json::from_str(json).unwrap();
        let page = CommentPage::from(resp);

        assert_eq!(page.comments.len(), 2);
        assert_eq!(page.comments[0].text, "mantap<br>keren");
        assert_eq!(page.next_page_token.as_deref(), Some("QURTSl9p"));
    }

    #[test]
    fn test_last_page_has_no_token() {
        let json = r#"{"items": [], "nextPageToken": ""}"#;
        let resp: CommentThreadListResponse = serde_json::from_str(json).unwrap();
        assert!(CommentPage::from(resp).next_page_token.is_none());
    }
}
