use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::post::{Post, PostListParams, PostRequest},
    utils::jwt::Claims,
};

/// Create a new post owned by the caller.
pub async fn create_post(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let content = payload.into_content()?;

    let post = sqlx::query_as::<_, Post>(
        r#"
        WITH inserted AS (
            INSERT INTO posts ("userId", "textContent", "mediaUrls")
            VALUES ($1, $2, $3)
            RETURNING *
        )
        SELECT
            p."postId", p."userId", u."username", u."profilePictureUrl",
            p."textContent", p."mediaUrls", p."createdAt", p."updatedAt"
        FROM inserted p
        JOIN users u ON u."userId" = p."userId"
        "#,
    )
    .bind(claims.user_id)
    .bind(&content.text_content)
    .bind(&content.media_urls)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create post: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(post_id = post.post_id, user_id = claims.user_id, "post created");

    Ok((StatusCode::CREATED, Json(post)))
}

/// List posts (Recent first).
/// Supports cursor-based pagination on (createdAt, postId).
pub async fn list_posts(
    State(pool): State<PgPool>,
    query: Result<Query<PostListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = query?;
    let posts = sqlx::query_as::<_, Post>(
        r#"
        SELECT
            p."postId", p."userId", u."username", u."profilePictureUrl",
            p."textContent", p."mediaUrls", p."createdAt", p."updatedAt"
        FROM posts p
        JOIN users u ON u."userId" = p."userId"
        WHERE $1::TIMESTAMPTZ IS NULL
           OR p."createdAt" < $1
           OR ($2::BIGINT IS NOT NULL AND p."createdAt" = $1 AND p."postId" < $2)
        ORDER BY p."createdAt" DESC, p."postId" DESC
        LIMIT $3
        "#,
    )
    .bind(params.cursor)
    .bind(params.cursor_id)
    .bind(params.limit())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list posts: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(posts))
}

/// Get a single post by ID.
pub async fn get_post(
    State(pool): State<PgPool>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(post_id) = path?;
    let post = fetch_post(&pool, post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

async fn fetch_post(pool: &PgPool, post_id: i64) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT
            p."postId", p."userId", u."username", u."profilePictureUrl",
            p."textContent", p."mediaUrls", p."createdAt", p."updatedAt"
        FROM posts p
        JOIN users u ON u."userId" = p."userId"
        WHERE p."postId" = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Loads the owner of a post and checks it against the caller.
async fn ensure_post_owner(pool: &PgPool, post_id: i64, claims: &Claims) -> Result<(), AppError> {
    let owner: i64 = sqlx::query_scalar(r#"SELECT "userId" FROM posts WHERE "postId" = $1"#)
        .bind(post_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    if owner != claims.user_id {
        return Err(AppError::Forbidden(
            "You are not authorized to modify this post".to_string(),
        ));
    }
    Ok(())
}

/// Edit a post. Requires: Login + Author.
pub async fn update_post(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(post_id) = path?;
    let Json(payload) = payload?;

    ensure_post_owner(&pool, post_id, &claims).await?;
    let content = payload.into_content()?;

    // The owner filter keeps the write safe even if ownership changed in between.
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET "textContent" = $1, "mediaUrls" = $2, "updatedAt" = NOW()
        WHERE "postId" = $3 AND "userId" = $4
        "#,
    )
    .bind(&content.text_content)
    .bind(&content.media_urls)
    .bind(post_id)
    .bind(claims.user_id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    let post = fetch_post(&pool, post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

/// Delete a post and its comments. Requires: Login + Author.
pub async fn delete_post(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(post_id) = path?;
    ensure_post_owner(&pool, post_id, &claims).await?;

    sqlx::query(r#"DELETE FROM posts WHERE "postId" = $1 AND "userId" = $2"#)
        .bind(post_id)
        .bind(claims.user_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete post: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    tracing::info!(post_id, user_id = claims.user_id, "post deleted");

    Ok(StatusCode::NO_CONTENT)
}
