use std::env;

/// Signing secrets and lifetimes for the two token classes.
///
/// Loaded once at startup and handed to `TokenManager`; nothing reads the
/// secrets from the environment after that point.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
}

pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub cors_origin: String,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            auth: AuthConfig {
                access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                    .expect("ACCESS_TOKEN_SECRET must be set"),
                refresh_token_secret: env::var("REFRESH_TOKEN_SECRET")
                    .expect("REFRESH_TOKEN_SECRET must be set"),
                access_token_ttl_minutes: env::var("ACCESS_TOKEN_EXPIRY_MINUTES")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .expect("ACCESS_TOKEN_EXPIRY_MINUTES must be a number"),
                refresh_token_ttl_days: env::var("REFRESH_TOKEN_EXPIRY_DAYS")
                    .unwrap_or_else(|_| "7".to_string())
                    .parse()
                    .expect("REFRESH_TOKEN_EXPIRY_DAYS must be a number"),
            },
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
