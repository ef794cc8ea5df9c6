use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        fight::{Fight, FightListParams, FightRequest},
        user::UserType,
    },
    utils::jwt::Claims,
};

/// Add a fight to the caller's history. Fighter accounts only.
pub async fn create_fight(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<FightRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let user_type: UserType =
        sqlx::query_scalar(r#"SELECT "userType" FROM users WHERE "userId" = $1"#)
            .bind(claims.user_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;

    if user_type != UserType::Fighter {
        return Err(AppError::Forbidden(
            "Only fighters can record fights".to_string(),
        ));
    }

    let fight = payload.validated()?;

    let fight = sqlx::query_as::<_, Fight>(
        r#"
        INSERT INTO fights ("fighterId", "date", "outcome", "decision", "promotion")
        VALUES ($1, $2, $3, $4, $5)
        RETURNING "fightId", "fighterId", "date", "outcome", "decision", "promotion"
        "#,
    )
    .bind(claims.user_id)
    .bind(fight.date)
    .bind(fight.outcome)
    .bind(&fight.decision)
    .bind(&fight.promotion)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record fight: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(fight)))
}

/// A fighter's fight history, most recent first. Empty for promoters.
pub(crate) async fn fight_history(pool: &PgPool, fighter_id: i64) -> Result<Vec<Fight>, AppError> {
    let fights = sqlx::query_as::<_, Fight>(
        r#"
        SELECT "fightId", "fighterId", "date", "outcome", "decision", "promotion"
        FROM fights
        WHERE "fighterId" = $1
        ORDER BY "date" DESC, "fightId" DESC
        "#,
    )
    .bind(fighter_id)
    .fetch_all(pool)
    .await?;

    Ok(fights)
}

/// List fights by `?fighterId=`.
pub async fn list_fights(
    State(pool): State<PgPool>,
    query: Result<Query<FightListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = query?;
    let fights = fight_history(&pool, params.fighter_id).await?;

    Ok(Json(fights))
}

/// Get a single fight record.
pub async fn get_fight(
    State(pool): State<PgPool>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(fight_id) = path?;
    let fight = sqlx::query_as::<_, Fight>(
        r#"
        SELECT "fightId", "fighterId", "date", "outcome", "decision", "promotion"
        FROM fights
        WHERE "fightId" = $1
        "#,
    )
    .bind(fight_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Fight not found".to_string()))?;

    Ok(Json(fight))
}

async fn ensure_fight_owner(pool: &PgPool, fight_id: i64, claims: &Claims) -> Result<(), AppError> {
    let owner: i64 = sqlx::query_scalar(r#"SELECT "fighterId" FROM fights WHERE "fightId" = $1"#)
        .bind(fight_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Fight not found".to_string()))?;

    if owner != claims.user_id {
        return Err(AppError::Forbidden(
            "You are not authorized to modify this fight".to_string(),
        ));
    }
    Ok(())
}

/// Edit a fight record. Requires: Login + owning fighter.
pub async fn update_fight(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<FightRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(fight_id) = path?;
    let Json(payload) = payload?;

    ensure_fight_owner(&pool, fight_id, &claims).await?;
    let fight = payload.validated()?;

    let fight = sqlx::query_as::<_, Fight>(
        r#"
        UPDATE fights
        SET "date" = $1, "outcome" = $2, "decision" = $3, "promotion" = $4
        WHERE "fightId" = $5 AND "fighterId" = $6
        RETURNING "fightId", "fighterId", "date", "outcome", "decision", "promotion"
        "#,
    )
    .bind(fight.date)
    .bind(fight.outcome)
    .bind(&fight.decision)
    .bind(&fight.promotion)
    .bind(fight_id)
    .bind(claims.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Fight not found".to_string()))?;

    Ok(Json(fight))
}

/// Delete a fight record. Requires: Login + owning fighter.
pub async fn delete_fight(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(fight_id) = path?;
    ensure_fight_owner(&pool, fight_id, &claims).await?;

    sqlx::query(r#"DELETE FROM fights WHERE "fightId" = $1 AND "fighterId" = $2"#)
        .bind(fight_id)
        .bind(claims.user_id)
        .execute(&pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
