// src/config.rs

use std::env;
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub port: u16,
    /// Directory the participant and admin pages are served from.
    pub public_dir: String,
    /// Fixed seed for participant views. Unset in production.
    pub rng_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://quizroom.db?mode=rwc".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let public_dir = env::var("PUBLIC_DIR")
            .unwrap_or_else(|_| "public".to_string());

        let rng_seed = env::var("QUIZ_RNG_SEED")
            .ok()
            .and_then(|s| s.parse().ok());

        Self {
            database_url,
            rust_log,
            port,
            public_dir,
            rng_seed,
        }
    }
}
