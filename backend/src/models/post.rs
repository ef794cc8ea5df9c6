use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    error::AppError,
    utils::validate::Violations,
};

/// Maximum number of media attachments on one post.
pub const MAX_MEDIA: usize = 4;

/// A row of the 'posts' table joined with its author.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Post {
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub text_content: String,
    /// Ordered references to externally hosted media.
    pub media_urls: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating or editing a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    #[serde(default)]
    #[validate(length(max = 5000, message = "textContent must be at most 5000 characters"))]
    pub text_content: String,

    #[serde(default)]
    pub media_urls: Vec<String>,
}

/// Post content that passed validation. Text is stored as typed, only trimmed.
#[derive(Debug, PartialEq)]
pub struct PostContent {
    pub text_content: String,
    pub media_urls: Vec<String>,
}

impl PostRequest {
    pub fn into_content(self) -> Result<PostContent, AppError> {
        let mut violations = Violations::default();
        violations.extend_from(self.validate());

        let text_content = self.text_content.trim().to_string();
        let media_urls: Vec<String> = self
            .media_urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        if media_urls.len() > MAX_MEDIA {
            violations.push(format!("a post can have at most {} media files", MAX_MEDIA));
        }
        for url in &media_urls {
            violations.check_url(Some(url.as_str()), "mediaUrls");
        }
        if text_content.is_empty() && media_urls.is_empty() {
            violations.push("Post must have either text or media");
        }

        violations.finish(Some(PostContent {
            text_content,
            media_urls,
        }))
    }
}

/// Query parameters for listing posts.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListParams {
    /// Cursor for pagination: the createdAt timestamp of the last post in the previous page.
    pub cursor: Option<chrono::DateTime<chrono::Utc>>,

    /// postId of that last post; breaks ties between posts sharing a createdAt.
    pub cursor_id: Option<i64>,

    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
}

impl PostListParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}
