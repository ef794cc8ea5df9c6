// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Seven days.
const DEFAULT_JWT_EXPIRATION: u64 = 60 * 60 * 24 * 7;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    /// Directory holding the built client bundle (index.html + assets).
    pub client_dist_dir: String,
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Reads configuration from the environment (and `.env` if present).
    ///
    /// Panics when `DATABASE_URL` or `JWT_SECRET` is missing: the server
    /// must not start without a database or a signing key.
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        if jwt_secret.trim().is_empty() {
            panic!("JWT_SECRET must not be empty");
        }

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_JWT_EXPIRATION);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let client_dist_dir =
            env::var("CLIENT_DIST_DIR").unwrap_or_else(|_| "../client/dist".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:5173".to_string(),
                    "http://127.0.0.1:5173".to_string(),
                ]
            });

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            client_dist_dir,
            cors_origins,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
