// src/models/user.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    error::AppError,
    utils::validate::{Violations, empty_as_none, is_valid_username},
};

/// Account role, fixed when the account is created.
/// Maps to the Postgres enum `user_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Fighter,
    Promoter,
}

impl FromStr for UserType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fighter" => Ok(UserType::Fighter),
            "promoter" => Ok(UserType::Promoter),
            other => Err(AppError::BadRequest(format!(
                "userType '{}' is not recognized",
                other
            ))),
        }
    }
}

/// Represents a row of the 'users' table, including the password hash.
/// Only used for sign-in; never serialized.
#[derive(Clone, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    /// Argon2 PHC string.
    pub hashed_password: String,
    pub profile_picture_url: Option<String>,
    pub user_type: UserType,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("hashed_password", &"<redacted>")
            .field("user_type", &self.user_type)
            .finish()
    }
}

/// Role-specific fields of a fighter account ('fighters' table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FighterFields {
    pub weight: i32,
    pub height: String,
    /// Free-text win-loss-draw summary, e.g. "10-2-0".
    pub record: String,
    pub gym_name: Option<String>,
    pub pullouts: i32,
    pub weight_misses: i32,
    pub finishes: i32,
}

/// Role-specific fields of a promoter account ('promoters' table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoterFields {
    pub promotion: String,
    pub promoter: String,
    pub next_event: Option<NaiveDate>,
}

/// The extension record of an account. Exactly one exists per account and
/// its variant always agrees with the stored `userType`.
///
/// Serialized inline with a `userType` tag, so a profile reads as
/// `{"userType": "fighter", "weight": 145, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "userType", rename_all = "lowercase")]
pub enum RoleFields {
    Fighter(FighterFields),
    Promoter(PromoterFields),
}

impl RoleFields {
    pub fn user_type(&self) -> UserType {
        match self {
            RoleFields::Fighter(_) => UserType::Fighter,
            RoleFields::Promoter(_) => UserType::Promoter,
        }
    }
}

/// Public base fields of an account.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct AccountBase {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub location: String,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Full public profile: base fields merged with the role fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(flatten)]
    pub base: AccountBase,
    #[serde(flatten)]
    pub role: RoleFields,
}

/// Response for a successful registration. Email is only echoed back to
/// its owner; it is not part of the public profile.
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub email: String,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Row shape of the profile query: users LEFT JOIN fighters/promoters.
#[derive(Debug, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct ProfileRow {
    #[sqlx(flatten)]
    pub base: AccountBase,
    pub user_type: UserType,

    pub weight: Option<i32>,
    pub height: Option<String>,
    pub record: Option<String>,
    pub gym_name: Option<String>,
    pub pullouts: Option<i32>,
    pub weight_misses: Option<i32>,
    pub finishes: Option<i32>,

    pub promotion: Option<String>,
    pub promoter: Option<String>,
    pub next_event: Option<NaiveDate>,
}

impl ProfileRow {
    /// Assembles the profile from the joined row. A missing extension row
    /// for the stored `userType` is reported as not found.
    pub fn into_profile(self) -> Result<Profile, AppError> {
        let role = match self.user_type {
            UserType::Fighter => match (
                self.weight,
                self.height,
                self.record,
                self.pullouts,
                self.weight_misses,
                self.finishes,
            ) {
                (
                    Some(weight),
                    Some(height),
                    Some(record),
                    Some(pullouts),
                    Some(weight_misses),
                    Some(finishes),
                ) => RoleFields::Fighter(FighterFields {
                    weight,
                    height,
                    record,
                    gym_name: self.gym_name,
                    pullouts,
                    weight_misses,
                    finishes,
                }),
                _ => return Err(missing_extension(self.base.user_id, UserType::Fighter)),
            },
            UserType::Promoter => match (self.promotion, self.promoter) {
                (Some(promotion), Some(promoter)) => RoleFields::Promoter(PromoterFields {
                    promotion,
                    promoter,
                    next_event: self.next_event,
                }),
                _ => return Err(missing_extension(self.base.user_id, UserType::Promoter)),
            },
        };

        Ok(Profile {
            base: self.base,
            role,
        })
    }
}

fn missing_extension(user_id: i64, user_type: UserType) -> AppError {
    tracing::error!(user_id, ?user_type, "account has no extension row");
    AppError::NotFound("Profile details not found".to_string())
}

/// Fighter fields as they arrive in a request body.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FighterInput {
    #[validate(range(min = 0, max = 1000, message = "weight must be between 0 and 1000"))]
    pub weight: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 20, message = "height must be at most 20 characters"))]
    pub height: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 20, message = "record must be at most 20 characters"))]
    pub record: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 100, message = "gymName must be at most 100 characters"))]
    pub gym_name: Option<String>,
    #[validate(range(min = 0, message = "pullouts must not be negative"))]
    pub pullouts: Option<i32>,
    #[validate(range(min = 0, message = "weightMisses must not be negative"))]
    pub weight_misses: Option<i32>,
    #[validate(range(min = 0, message = "finishes must not be negative"))]
    pub finishes: Option<i32>,
}

impl FighterInput {
    pub fn into_fields(self, violations: &mut Violations) -> Option<FighterFields> {
        violations.extend_from(self.validate());

        let weight = violations.require(self.weight, "weight");
        let height = violations.require(self.height, "height");
        let record = violations.require(self.record, "record");
        let pullouts = violations.require(self.pullouts, "pullouts");
        let weight_misses = violations.require(self.weight_misses, "weightMisses");
        let finishes = violations.require(self.finishes, "finishes");

        Some(FighterFields {
            weight: weight?,
            height: height?,
            record: record?,
            gym_name: self.gym_name,
            pullouts: pullouts?,
            weight_misses: weight_misses?,
            finishes: finishes?,
        })
    }
}

/// Promoter fields as they arrive in a request body.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PromoterInput {
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 100, message = "promotion must be at most 100 characters"))]
    pub promotion: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 100, message = "promoter must be at most 100 characters"))]
    pub promoter: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub next_event: Option<NaiveDate>,
}

impl PromoterInput {
    pub fn into_fields(self, violations: &mut Violations) -> Option<PromoterFields> {
        violations.extend_from(self.validate());

        let promotion = violations.require(self.promotion, "promotion");
        let promoter = violations.require(self.promoter, "promoter");

        Some(PromoterFields {
            promotion: promotion?,
            promoter: promoter?,
            next_event: self.next_event,
        })
    }
}

/// Picks and validates the role fields matching `user_type`. The other
/// role's fields in the body are ignored.
fn role_fields(
    user_type: UserType,
    fighter: FighterInput,
    promoter: PromoterInput,
    violations: &mut Violations,
) -> Option<RoleFields> {
    match user_type {
        UserType::Fighter => fighter.into_fields(violations).map(RoleFields::Fighter),
        UserType::Promoter => promoter.into_fields(violations).map(RoleFields::Promoter),
    }
}

/// DTO for registration. Every field is optional at the serde level so
/// that validation can report all problems in one response.
#[derive(Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub username: Option<String>,
    #[validate(length(
        min = 8,
        max = 128,
        message = "password length must be between 8 and 128 characters"
    ))]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 100, message = "fullName must be at most 100 characters"))]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 500, message = "bio must be at most 500 characters"))]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 100, message = "location must be at most 100 characters"))]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub profile_picture_url: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub user_type: Option<String>,

    #[serde(flatten)]
    pub fighter: FighterInput,
    #[serde(flatten)]
    pub promoter: PromoterInput,
}

/// A registration that passed validation.
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub location: String,
    pub profile_picture_url: Option<String>,
    pub role: RoleFields,
}

impl SignUpRequest {
    pub fn into_new_account(self) -> Result<NewAccount, AppError> {
        let mut violations = Violations::default();
        violations.extend_from(self.validate());

        let email = violations.require(self.email, "email");
        let username = violations.require(self.username, "username");
        if let Some(name) = &username {
            if !is_valid_username(name) {
                violations.push(
                    "username must be 3 to 30 letters, digits, underscores or dots",
                );
            }
        }
        let password = violations.require(self.password.filter(|p| !p.is_empty()), "password");
        let full_name = violations.require(self.full_name, "fullName");
        let location = violations.require(self.location, "location");
        violations.check_url(self.profile_picture_url.as_deref(), "profilePictureUrl");

        let role = match self.user_type.as_deref() {
            Some(raw) => match raw.parse::<UserType>() {
                Ok(user_type) => {
                    role_fields(user_type, self.fighter, self.promoter, &mut violations)
                }
                Err(_) => {
                    violations.push(format!("userType '{}' is not recognized", raw));
                    None
                }
            },
            None => violations.require(None, "userType"),
        };

        let account = match (email, username, password, full_name, location, role) {
            (
                Some(email),
                Some(username),
                Some(password),
                Some(full_name),
                Some(location),
                Some(role),
            ) => Some(NewAccount {
                email,
                username,
                password,
                full_name,
                bio: self.bio,
                location,
                profile_picture_url: self.profile_picture_url,
                role,
            }),
            _ => None,
        };

        violations.finish(account)
    }
}

/// DTO for user sign-in: email or username, plus password.
#[derive(Default, Deserialize)]
pub struct SignInRequest {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub password: String,
}

/// Identity returned next to the token after sign-in.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    pub user_type: UserType,
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
    pub user: SessionUser,
    pub token: String,
}

/// DTO for updating a profile. `userType` in the body is ignored; the
/// stored type decides which role fields apply.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 100, message = "fullName must be at most 100 characters"))]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 500, message = "bio must be at most 500 characters"))]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 100, message = "location must be at most 100 characters"))]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub profile_picture_url: Option<String>,

    #[serde(flatten)]
    pub fighter: FighterInput,
    #[serde(flatten)]
    pub promoter: PromoterInput,
}

/// A profile update that passed validation.
#[derive(Debug)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub bio: Option<String>,
    pub location: String,
    /// `None` keeps the current picture.
    pub profile_picture_url: Option<String>,
    pub role: RoleFields,
}

impl UpdateProfileRequest {
    pub fn into_update(self, user_type: UserType) -> Result<ProfileUpdate, AppError> {
        let mut violations = Violations::default();
        violations.extend_from(self.validate());

        let full_name = violations.require(self.full_name, "fullName");
        let location = violations.require(self.location, "location");
        violations.check_url(self.profile_picture_url.as_deref(), "profilePictureUrl");
        let role = role_fields(user_type, self.fighter, self.promoter, &mut violations);

        let update = match (full_name, location, role) {
            (Some(full_name), Some(location), Some(role)) => Some(ProfileUpdate {
                full_name,
                bio: self.bio,
                location,
                profile_picture_url: self.profile_picture_url,
                role,
            }),
            _ => None,
        };

        violations.finish(update)
    }
}

/// Search result entry.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub profile_picture_url: Option<String>,
    pub user_type: UserType,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fighter_body() -> serde_json::Value {
        json!({
            "email": "a@x.com",
            "username": "ali",
            "password": "pw123456",
            "fullName": "Ali K",
            "location": "NYC",
            "userType": "fighter",
            "weight": 145,
            "height": "5'9\"",
            "record": "10-2-0",
            "pullouts": 0,
            "weightMisses": 1,
            "finishes": 5
        })
    }

    fn bad_request_message(err: AppError) -> String {
        match err {
            AppError::BadRequest(msg) => msg,
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn fighter_sign_up_becomes_fighter_account() {
        let request: SignUpRequest = serde_json::from_value(fighter_body()).unwrap();
        let account = request.into_new_account().unwrap();

        assert_eq!(account.username, "ali");
        assert_eq!(account.role.user_type(), UserType::Fighter);
        match account.role {
            RoleFields::Fighter(f) => {
                assert_eq!(f.weight, 145);
                assert_eq!(f.record, "10-2-0");
                assert_eq!(f.weight_misses, 1);
                assert!(f.gym_name.is_none());
            }
            RoleFields::Promoter(_) => panic!("expected fighter fields"),
        }
    }

    #[test]
    fn promoter_fields_in_fighter_body_are_ignored() {
        let mut body = fighter_body();
        body["promotion"] = json!("PFL");
        let request: SignUpRequest = serde_json::from_value(body).unwrap();
        let account = request.into_new_account().unwrap();
        assert!(matches!(account.role, RoleFields::Fighter(_)));
    }

    #[test]
    fn promoter_sign_up_accepts_blank_next_event() {
        let request: SignUpRequest = serde_json::from_value(json!({
            "email": "p@x.com",
            "username": "promo",
            "password": "pw123456",
            "fullName": "Pat Promo",
            "location": "LA",
            "userType": "promoter",
            "promotion": "Cage Kings",
            "promoter": "Pat",
            "nextEvent": ""
        }))
        .unwrap();
        let account = request.into_new_account().unwrap();
        assert_eq!(
            account.role,
            RoleFields::Promoter(PromoterFields {
                promotion: "Cage Kings".to_string(),
                promoter: "Pat".to_string(),
                next_event: None,
            })
        );
    }

    #[test]
    fn all_violations_are_reported_together() {
        let request: SignUpRequest = serde_json::from_value(json!({
            "email": "not-an-email",
            "password": "short",
            "userType": "fighter",
            "weight": -3
        }))
        .unwrap();
        let msg = bad_request_message(request.into_new_account().err().unwrap());

        for expected in [
            "email must be a valid email address",
            "password length",
            "username is required",
            "fullName is required",
            "location is required",
            "weight must be between",
            "height is required",
            "record is required",
        ] {
            assert!(msg.contains(expected), "missing '{}' in '{}'", expected, msg);
        }
    }

    #[test]
    fn unknown_user_type_is_a_validation_error() {
        let mut body = fighter_body();
        body["userType"] = json!("referee");
        let request: SignUpRequest = serde_json::from_value(body).unwrap();
        let msg = bad_request_message(request.into_new_account().err().unwrap());
        assert!(msg.contains("userType 'referee' is not recognized"));
    }

    #[test]
    fn missing_user_type_is_required() {
        let mut body = fighter_body();
        body.as_object_mut().unwrap().remove("userType");
        let request: SignUpRequest = serde_json::from_value(body).unwrap();
        let msg = bad_request_message(request.into_new_account().err().unwrap());
        assert!(msg.contains("userType is required"));
    }

    #[test]
    fn invalid_username_characters_are_rejected() {
        let mut body = fighter_body();
        body["username"] = json!("ali k");
        let request: SignUpRequest = serde_json::from_value(body).unwrap();
        assert!(request.into_new_account().is_err());
    }

    #[test]
    fn update_uses_stored_type_not_body_type() {
        let request: UpdateProfileRequest = serde_json::from_value(json!({
            "fullName": "Pat Promo",
            "location": "LA",
            "userType": "fighter",
            "promotion": "Cage Kings",
            "promoter": "Pat",
            "nextEvent": "2025-11-01"
        }))
        .unwrap();
        let update = request.into_update(UserType::Promoter).unwrap();
        assert_eq!(update.role.user_type(), UserType::Promoter);
    }

    #[test]
    fn update_for_fighter_requires_fighter_fields() {
        let request: UpdateProfileRequest = serde_json::from_value(json!({
            "fullName": "Ali K",
            "location": "NYC",
            "promotion": "Cage Kings",
            "promoter": "Pat"
        }))
        .unwrap();
        let msg = bad_request_message(request.into_update(UserType::Fighter).unwrap_err());
        assert!(msg.contains("weight is required"));
    }

    #[test]
    fn profile_serializes_flat_with_user_type_tag() {
        let profile = Profile {
            base: AccountBase {
                user_id: 5,
                username: "ali".to_string(),
                full_name: "Ali K".to_string(),
                bio: None,
                location: "NYC".to_string(),
                profile_picture_url: None,
                created_at: Utc::now(),
            },
            role: RoleFields::Fighter(FighterFields {
                weight: 145,
                height: "5'9\"".to_string(),
                record: "10-2-0".to_string(),
                gym_name: Some("Tiger Muay Thai".to_string()),
                pullouts: 0,
                weight_misses: 1,
                finishes: 5,
            }),
        };

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["userId"], 5);
        assert_eq!(value["userType"], "fighter");
        assert_eq!(value["weightMisses"], 1);
        assert_eq!(value["gymName"], "Tiger Muay Thai");
        assert!(value.get("role").is_none());
        assert!(value.get("promotion").is_none());
    }

    fn row(user_type: UserType) -> ProfileRow {
        ProfileRow {
            base: AccountBase {
                user_id: 9,
                username: "pat".to_string(),
                full_name: "Pat".to_string(),
                bio: Some("Promoter".to_string()),
                location: "LA".to_string(),
                profile_picture_url: None,
                created_at: Utc::now(),
            },
            user_type,
            weight: None,
            height: None,
            record: None,
            gym_name: None,
            pullouts: None,
            weight_misses: None,
            finishes: None,
            promotion: Some("Cage Kings".to_string()),
            promoter: Some("Pat".to_string()),
            next_event: None,
        }
    }

    #[test]
    fn joined_row_becomes_promoter_profile() {
        let profile = row(UserType::Promoter).into_profile().unwrap();
        assert_eq!(profile.role.user_type(), UserType::Promoter);
    }

    #[test]
    fn missing_extension_is_not_found() {
        let err = row(UserType::Fighter).into_profile().unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn user_debug_redacts_hash() {
        let user = User {
            user_id: 1,
            email: "a@x.com".to_string(),
            username: "ali".to_string(),
            hashed_password: "$argon2id$v=19$secret".to_string(),
            profile_picture_url: None,
            user_type: UserType::Fighter,
        };
        let printed = format!("{:?}", user);
        assert!(!printed.contains("argon2"));
    }
}
