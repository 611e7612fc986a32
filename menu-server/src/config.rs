//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Upper bound of the connection pool
    pub db_max_connections: u32,
    /// Overrides the default log filter when `RUST_LOG` is unset
    pub log_level: Option<String>,
    /// Daily-rolling log files are written here when the directory exists
    pub log_dir: Option<String>,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: parse_var("HTTP_PORT", 8080)?,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 10)?,
            log_level: std::env::var("LOG_LEVEL").ok().filter(|s| !s.is_empty()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|v| split_origins(&v))
                .unwrap_or_default(),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, BoxError> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| format!("{name} is not valid: {raw}").into()),
        _ => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
