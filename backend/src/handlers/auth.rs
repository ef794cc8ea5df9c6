// src/handlers/auth.rs

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::{
    config::Config,
    error::AppError,
    models::user::{
        AccountBase, Profile, RoleFields, SessionUser, SignInRequest, SignInResponse,
        SignUpRequest, SignUpResponse, User,
    },
    utils::{
        hash::{hash_password_blocking, verify_password_blocking},
        jwt::sign_jwt,
    },
};

const INVALID_LOGIN: &str = "invalid login";

const USER_COLUMNS: &str = r#"
    SELECT "userId", "email", "username", "hashedPassword", "profilePictureUrl", "userType"
    FROM users
"#;

/// Registers a new account together with its role extension.
///
/// The account row and the extension row are written in one transaction,
/// so a half-created account is never visible.
/// Returns 201 Created and the public account fields (no password hash).
pub async fn sign_up(
    State(pool): State<PgPool>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let account = payload.into_new_account()?;
    let hashed_password = hash_password_blocking(account.password.clone()).await?;

    let mut tx = pool.begin().await?;

    // Email is reported before username when both collide.
    let taken: Vec<(String, String)> = sqlx::query_as(
        r#"SELECT "email", "username" FROM users WHERE "email" = $1 OR "username" = $2"#,
    )
    .bind(&account.email)
    .bind(&account.username)
    .fetch_all(&mut *tx)
    .await?;

    if taken.iter().any(|(email, _)| *email == account.email) {
        return Err(AppError::Conflict("email already in use.".to_string()));
    }
    if taken.iter().any(|(_, username)| *username == account.username) {
        return Err(AppError::Conflict("username is taken.".to_string()));
    }

    let (user_id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
        r#"
        INSERT INTO users ("email", "username", "hashedPassword", "fullName", "bio", "location", "profilePictureUrl", "userType")
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING "userId", "createdAt"
        "#,
    )
    .bind(&account.email)
    .bind(&account.username)
    .bind(&hashed_password)
    .bind(&account.full_name)
    .bind(&account.bio)
    .bind(&account.location)
    .bind(&account.profile_picture_url)
    .bind(account.role.user_type())
    .fetch_one(&mut *tx)
    .await
    .map_err(unique_violation)?;

    insert_role_fields(&mut tx, user_id, &account.role).await?;

    tx.commit().await?;

    tracing::info!(
        user_id,
        username = %account.username,
        user_type = ?account.role.user_type(),
        "account registered"
    );

    let response = SignUpResponse {
        email: account.email,
        profile: Profile {
            base: AccountBase {
                user_id,
                username: account.username,
                full_name: account.full_name,
                bio: account.bio,
                location: account.location,
                profile_picture_url: account.profile_picture_url,
                created_at,
            },
            role: account.role,
        },
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Writes the one extension row matching the account's role.
async fn insert_role_fields(
    conn: &mut PgConnection,
    user_id: i64,
    role: &RoleFields,
) -> Result<(), AppError> {
    match role {
        RoleFields::Fighter(f) => {
            sqlx::query(
                r#"
                INSERT INTO fighters ("userId", "weight", "height", "record", "gymName", "pullouts", "weightMisses", "finishes")
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(user_id)
            .bind(f.weight)
            .bind(&f.height)
            .bind(&f.record)
            .bind(&f.gym_name)
            .bind(f.pullouts)
            .bind(f.weight_misses)
            .bind(f.finishes)
            .execute(&mut *conn)
            .await?;
        }
        RoleFields::Promoter(p) => {
            sqlx::query(
                r#"
                INSERT INTO promoters ("userId", "promotion", "promoter", "nextEvent")
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(user_id)
            .bind(&p.promotion)
            .bind(&p.promoter)
            .bind(p.next_event)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

/// A concurrent registration can slip past the pre-check; the unique
/// constraints still catch it.
fn unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_email_key") => AppError::Conflict("email already in use.".to_string()),
                Some("users_username_key") => AppError::Conflict("username is taken.".to_string()),
                _ => AppError::Conflict("account already exists.".to_string()),
            };
        }
    }
    tracing::error!("Failed to register account: {:?}", e);
    AppError::from(e)
}

/// Authenticates by email or username and returns a JWT token.
///
/// Every failure is the same 401 "invalid login", so the response does not
/// reveal which part was wrong.
pub async fn sign_in(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let user = if let Some(email) = payload.email.as_deref() {
        sqlx::query_as::<_, User>(&format!(r#"{} WHERE "email" = $1"#, USER_COLUMNS))
            .bind(email)
            .fetch_optional(&pool)
            .await?
    } else if let Some(username) = payload.username.as_deref() {
        sqlx::query_as::<_, User>(&format!(r#"{} WHERE "username" = $1"#, USER_COLUMNS))
            .bind(username)
            .fetch_optional(&pool)
            .await?
    } else {
        None
    };

    let user = user.ok_or_else(|| AppError::AuthError(INVALID_LOGIN.to_string()))?;

    let password_ok = !payload.password.is_empty()
        && verify_password_blocking(user.hashed_password.clone(), payload.password).await?;

    if !password_ok {
        tracing::info!(user_id = user.user_id, "sign-in rejected");
        return Err(AppError::AuthError(INVALID_LOGIN.to_string()));
    }

    let token = sign_jwt(
        user.user_id,
        &user.username,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    tracing::info!(user_id = user.user_id, "signed in");

    Ok(Json(SignInResponse {
        user: SessionUser {
            user_id: user.user_id,
            username: user.username,
            user_type: user.user_type,
            profile_picture_url: user.profile_picture_url,
        },
        token,
    }))
}
