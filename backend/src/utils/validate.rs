// src/utils/validate.rs

//! Helpers for turning loosely-typed request bodies into validated values
//! while reporting every problem at once.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Deserializer, de};
use url::Url;
use validator::ValidationErrors;

use crate::error::AppError;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.]{3,30}$").expect("username pattern compiles"));

/// Deserializes an optional field, treating `null`, absence and blank
/// strings the same way. Non-blank values are trimmed and parsed.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

/// Media references are absolute http(s) URLs (external host) or
/// site-relative paths to bundled assets such as the default avatar.
pub fn is_media_reference(raw: &str) -> bool {
    if raw.starts_with('/') && !raw.starts_with("//") {
        return !raw.contains(char::is_whitespace);
    }
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

/// Accumulates validation failures across a whole request.
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Records the messages of a `validator` run, ordered by field name.
    pub fn extend_from(&mut self, result: Result<(), ValidationErrors>) {
        let Err(errors) = result else {
            return;
        };

        let mut messages: Vec<(String, String)> = Vec::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid ({})", field, error.code),
                };
                messages.push((field.to_string(), message));
            }
        }
        messages.sort();
        self.0.extend(messages.into_iter().map(|(_, message)| message));
    }

    /// Returns the value, or records "`field` is required".
    pub fn require<T>(&mut self, value: Option<T>, field: &str) -> Option<T> {
        if value.is_none() {
            self.push(format!("{} is required", field));
        }
        value
    }

    pub fn check_url(&mut self, value: Option<&str>, field: &str) {
        if let Some(raw) = value {
            if !is_media_reference(raw) {
                self.push(format!("{} must be an http(s) URL or a site path", field));
            }
        }
    }

    /// Fails with a single `BadRequest` listing every violation, or yields
    /// the value assembled by the caller.
    pub fn finish<T>(self, value: Option<T>) -> Result<T, AppError> {
        if !self.0.is_empty() {
            return Err(AppError::BadRequest(self.0.join("; ")));
        }
        value.ok_or_else(|| {
            AppError::InternalServerError("validated value was not assembled".to_string())
        })
    }
}
