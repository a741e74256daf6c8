use std::env;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::apply_security_headers;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/hotel";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub port: u16,
    pub cors_allowed_origins: String,
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            port: parse_or("SERVER_PORT", DEFAULT_PORT),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| cors::DEFAULT_ALLOWED_ORIGINS.to_string()),
            production: env::var("RUST_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Config: invalid {}='{}', using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
