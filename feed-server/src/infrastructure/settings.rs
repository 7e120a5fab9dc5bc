use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::domain::limits::PostLimits;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) database_url: String,
    pub(crate) database_max_connections: u32,
    pub(crate) jwt_secret: String,
    pub(crate) http_addr: String,
    pub(crate) cors_origins: Vec<String>,
    pub(crate) log_level: String,
    pub(crate) http_request_timeout_secs: u64,
    pub(crate) media_dir: PathBuf,
    pub(crate) max_post_length: usize,
    pub(crate) max_file_size_bytes: u64,
    pub(crate) max_comment_length: usize,
    pub(crate) feed_default_page_size: u32,
    pub(crate) feed_max_page_size: u32,
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self> {
        let database_url = get_required("DATABASE_URL").context("DATABASE_URL is required")?;
        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 10u32)?;
        let jwt_secret = get_required("JWT_SECRET").context("JWT_SECRET is required")?;

        if jwt_secret.chars().count() < 32 {
            return Err(anyhow!("JWT_SECRET must be at least 32 characters"));
        }

        let http_addr = std::env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let cors_origins = parse_cors_origins(
            std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:8000,http://127.0.0.1:8000".to_string()),
        );
        let log_level = std::env::var("LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());
        let http_request_timeout_secs = parse_env("HTTP_REQUEST_TIMEOUT_SECS", 30u64)?;
        let media_dir = PathBuf::from(
            std::env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".to_string()),
        );

        let defaults = PostLimits::default();
        let max_post_length = parse_env("MAX_POST_LENGTH", defaults.max_post_length)?;
        let max_file_size_bytes = parse_env("MAX_FILE_SIZE_BYTES", defaults.max_file_size_bytes)?;
        let max_comment_length = parse_env("MAX_COMMENT_LENGTH", defaults.max_comment_length)?;
        let feed_default_page_size =
            parse_env("FEED_DEFAULT_PAGE_SIZE", defaults.default_page_size)?;
        let feed_max_page_size = parse_env("FEED_MAX_PAGE_SIZE", defaults.max_page_size)?;

        if feed_default_page_size > feed_max_page_size {
            return Err(anyhow!(
                "FEED_DEFAULT_PAGE_SIZE must be <= FEED_MAX_PAGE_SIZE ({feed_max_page_size})"
            ));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            jwt_secret,
            http_addr,
            cors_origins,
            log_level,
            http_request_timeout_secs,
            media_dir,
            max_post_length,
            max_file_size_bytes,
            max_comment_length,
            feed_default_page_size,
            feed_max_page_size,
        })
    }

    pub(crate) fn post_limits(&self) -> PostLimits {
        PostLimits {
            max_post_length: self.max_post_length,
            max_file_size_bytes: self.max_file_size_bytes,
            max_comment_length: self.max_comment_length,
            default_page_size: self.feed_default_page_size,
            max_page_size: self.feed_max_page_size,
        }
    }

    /// Upper bound for a whole request body: one media file plus the text fields.
    pub(crate) fn http_request_body_limit_bytes(&self) -> usize {
        const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;
        usize::try_from(self.max_file_size_bytes.saturating_add(FORM_OVERHEAD_BYTES))
            .unwrap_or(usize::MAX)
    }
}

fn get_required(key: &str) -> Result<String> {
    let value = std::env::var(key)?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

fn parse_cors_origins(raw: String) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + std::fmt::Display + PartialEq + Default,
{
    let value = match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow!("Failed to parse {key}, expecting positive integer"))?,
        Err(_) => default,
    };

    if value == T::default() {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}
