use crate::auth::jwt::JwtConfig;

/// Default cap on the size of a pushed state document (64 MiB).
pub const DEFAULT_STATE_BODY_LIMIT_BYTES: usize = 64 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest state document accepted by a push.
    pub state_body_limit_bytes: usize,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                                  |
    /// |--------------------------|------------------------------------------|
    /// | `HOST`                   | `0.0.0.0`                                |
    /// | `PORT`                   | `8080`                                   |
    /// | `CORS_ORIGINS`           | `http://localhost:3000,http://localhost` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                                     |
    /// | `STATE_BODY_LIMIT_BYTES` | `67108864`                               |
    ///
    /// # Panics
    ///
    /// Panics if a variable is set but cannot be parsed, or if `JWT_SECRET`
    /// is missing.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let state_body_limit_bytes: usize = std::env::var("STATE_BODY_LIMIT_BYTES")
            .map(|v| {
                v.parse()
                    .expect("STATE_BODY_LIMIT_BYTES must be a valid usize")
            })
            .unwrap_or(DEFAULT_STATE_BODY_LIMIT_BYTES);

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            state_body_limit_bytes,
            jwt,
        }
    }
}

/// Database connection settings, read separately so the server config can be
/// built in tests without a `DATABASE_URL`.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// | Env Var                    | Default    |
    /// |----------------------------|------------|
    /// | `DATABASE_URL`             | (required) |
    /// | `DATABASE_MAX_CONNECTIONS` | `25`       |
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
            .map(|v| {
                v.parse()
                    .expect("DATABASE_MAX_CONNECTIONS must be a valid u32")
            })
            .unwrap_or(terraconsole_db::DEFAULT_MAX_CONNECTIONS);

        Self {
            url,
            max_connections,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
