use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection, QueryRejection}},
    response::IntoResponse,
};
use sqlx::{PgConnection, PgPool};

use crate::{
    error::AppError,
    handlers::fight::fight_history,
    models::{
        post::Post,
        user::{
            AccountBase, Profile, ProfileRow, RoleFields, SearchParams, UpdateProfileRequest,
            UserSummary, UserType,
        },
    },
    utils::jwt::Claims,
};

/// Get a public profile: base fields plus the role fields of its type.
pub async fn get_profile(
    State(pool): State<PgPool>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(user_id) = path?;
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT
            u."userId", u."username", u."fullName", u."bio", u."location",
            u."profilePictureUrl", u."createdAt", u."userType",
            f."weight", f."height", f."record", f."gymName",
            f."pullouts", f."weightMisses", f."finishes",
            p."promotion", p."promoter", p."nextEvent"
        FROM users u
        LEFT JOIN fighters f ON f."userId" = u."userId"
        LEFT JOIN promoters p ON p."userId" = u."userId"
        WHERE u."userId" = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(row.into_profile()?))
}

/// Update the caller's own profile.
///
/// The stored `userType` decides which extension table is written; the
/// base row and the extension row change together or not at all.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(user_id) = path?;
    if claims.user_id != user_id {
        tracing::warn!(
            caller = claims.user_id,
            target = user_id,
            "profile update by non-owner refused"
        );
        return Err(AppError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    let Json(payload) = payload?;

    let mut tx = pool.begin().await?;

    let user_type: UserType =
        sqlx::query_scalar(r#"SELECT "userType" FROM users WHERE "userId" = $1 FOR UPDATE"#)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;

    let update = payload.into_update(user_type)?;

    let base = sqlx::query_as::<_, AccountBase>(
        r#"
        UPDATE users
        SET "fullName" = $1,
            "bio" = $2,
            "location" = $3,
            "profilePictureUrl" = COALESCE($4, "profilePictureUrl")
        WHERE "userId" = $5
        RETURNING "userId", "username", "fullName", "bio", "location", "profilePictureUrl", "createdAt"
        "#,
    )
    .bind(&update.full_name)
    .bind(&update.bio)
    .bind(&update.location)
    .bind(&update.profile_picture_url)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    if update_role_fields(&mut tx, user_id, &update.role).await? == 0 {
        tracing::error!(user_id, ?user_type, "account has no extension row");
        // Dropping the transaction rolls back the base update.
        return Err(AppError::NotFound("Profile details not found".to_string()));
    }

    tx.commit().await?;

    tracing::info!(user_id, "profile updated");

    Ok(Json(Profile {
        base,
        role: update.role,
    }))
}

/// Updates the extension row matching `role`, returning the number of rows
/// changed. The other extension table is never touched.
async fn update_role_fields(
    conn: &mut PgConnection,
    user_id: i64,
    role: &RoleFields,
) -> Result<u64, AppError> {
    let result = match role {
        RoleFields::Fighter(f) => {
            sqlx::query(
                r#"
                UPDATE fighters
                SET "weight" = $1, "height" = $2, "record" = $3, "gymName" = $4,
                    "pullouts" = $5, "weightMisses" = $6, "finishes" = $7
                WHERE "userId" = $8
                "#,
            )
            .bind(f.weight)
            .bind(&f.height)
            .bind(&f.record)
            .bind(&f.gym_name)
            .bind(f.pullouts)
            .bind(f.weight_misses)
            .bind(f.finishes)
            .bind(user_id)
            .execute(&mut *conn)
            .await?
        }
        RoleFields::Promoter(p) => {
            sqlx::query(
                r#"
                UPDATE promoters
                SET "promotion" = $1, "promoter" = $2, "nextEvent" = $3
                WHERE "userId" = $4
                "#,
            )
            .bind(&p.promotion)
            .bind(&p.promoter)
            .bind(p.next_event)
            .bind(user_id)
            .execute(&mut *conn)
            .await?
        }
    };

    Ok(result.rows_affected())
}

/// List posts created by a user, newest first.
pub async fn list_user_posts(
    State(pool): State<PgPool>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(user_id) = path?;
    let posts = sqlx::query_as::<_, Post>(
        r#"
        SELECT
            p."postId", p."userId", u."username", u."profilePictureUrl",
            p."textContent", p."mediaUrls", p."createdAt", p."updatedAt"
        FROM posts p
        JOIN users u ON u."userId" = p."userId"
        WHERE p."userId" = $1
        ORDER BY p."createdAt" DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(posts))
}

/// List a fighter's fight history, most recent first.
/// Promoters simply have none.
pub async fn list_user_fights(
    State(pool): State<PgPool>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(user_id) = path?;
    let fights = fight_history(&pool, user_id).await?;

    Ok(Json(fights))
}

/// Case-insensitive username search.
pub async fn search_users(
    State(pool): State<PgPool>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = query?;
    let term = params.username.unwrap_or_default();
    let term = term.trim();
    if term.is_empty() {
        return Ok(Json(Vec::<UserSummary>::new()));
    }

    // Escape LIKE wildcards so the term matches literally.
    let pattern = format!(
        "%{}%",
        term.replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    );

    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT "userId", "username", "fullName", "profilePictureUrl", "userType"
        FROM users
        WHERE "username" ILIKE $1
        ORDER BY LOWER("username")
        LIMIT 20
        "#,
    )
    .bind(pattern)
    .fetch_all(&pool)
    .await?;

    Ok(Json(users))
}
