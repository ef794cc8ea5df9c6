use axum::{
    Extension, Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::comment::{Comment, CreateCommentRequest},
    utils::jwt::Claims,
};

/// Create a new comment on a post.
pub async fn create_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(post_id) = path?;
    let Json(payload) = payload?;
    let text = payload.into_text()?;

    // Insert only if the post exists; no row back means it does not.
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        WITH inserted AS (
            INSERT INTO comments ("postId", "userId", "text")
            SELECT "postId", $2, $3 FROM posts WHERE "postId" = $1
            RETURNING *
        )
        SELECT
            c."commentId", c."postId", c."userId", u."username",
            u."profilePictureUrl", c."text", c."createdAt"
        FROM inserted c
        JOIN users u ON u."userId" = c."userId"
        "#,
    )
    .bind(post_id)
    .bind(claims.user_id)
    .bind(&text)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// List all comments for a post, oldest first.
pub async fn list_comments(
    State(pool): State<PgPool>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(post_id) = path?;
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT
            c."commentId", c."postId", c."userId", u."username",
            u."profilePictureUrl", c."text", c."createdAt"
        FROM comments c
        JOIN users u ON u."userId" = c."userId"
        WHERE c."postId" = $1
        ORDER BY c."createdAt" ASC, c."commentId" ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(comments))
}

/// Delete a comment. Only its author may do so.
pub async fn delete_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(comment_id) = path?;
    let author: i64 =
        sqlx::query_scalar(r#"SELECT "userId" FROM comments WHERE "commentId" = $1"#)
            .bind(comment_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    if author != claims.user_id {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this comment".to_string(),
        ));
    }

    sqlx::query(r#"DELETE FROM comments WHERE "commentId" = $1 AND "userId" = $2"#)
        .bind(comment_id)
        .bind(claims.user_id)
        .execute(&pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
