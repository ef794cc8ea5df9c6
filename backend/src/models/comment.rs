use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    error::AppError,
    utils::validate::Violations,
};

/// A row of the 'comments' table joined with its author.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub text: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub text: String,
}

impl CreateCommentRequest {
    /// Returns the trimmed comment text.
    pub fn into_text(self) -> Result<String, AppError> {
        let mut violations = Violations::default();
        violations.extend_from(self.validate());

        let text = self.text.trim().to_string();
        if text.is_empty() {
            violations.push("Comment must not be empty");
        }
        violations.finish(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comment_is_rejected() {
        let req = CreateCommentRequest { text: "   ".to_string() };
        assert!(req.into_text().is_err());
    }

    #[test]
    fn comment_text_is_trimmed_not_escaped() {
        let req = CreateCommentRequest {
            text: "  Tom & Jerry: 5 < 6  ".to_string(),
        };
        assert_eq!(req.into_text().unwrap(), "Tom & Jerry: 5 < 6");
    }
}
