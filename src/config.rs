use anyhow::Context;

/// Longest accepted `SESSION_TTL_MINUTES`: one year.
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 365;
/// Cookie signing needs 64 bytes of key material.
pub const MIN_SESSION_SECRET_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Postgres,
    Memory,
}

impl SessionBackend {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown SESSION_BACKEND {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_minutes: i64,
    pub backend: SessionBackend,
    pub cookie_secure: bool,
}

impl SessionConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.secret.trim().is_empty() {
            anyhow::bail!("SESSION_SECRET must not be empty");
        }
        if self.secret.len() < MIN_SESSION_SECRET_LEN {
            anyhow::bail!("SESSION_SECRET must be at least {MIN_SESSION_SECRET_LEN} bytes");
        }
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&self.ttl_minutes) {
            anyhow::bail!(
                "SESSION_TTL_MINUTES must be between 1 and {MAX_SESSION_TTL_MINUTES}, got {}",
                self.ttl_minutes
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub session: SessionConfig,
    pub host: String,
    pub port: u16,
    pub public_dir: String,
    /// Lets `GET /api/tasks` trust the `userId` query parameter without a session.
    pub tasks_list_legacy_query_auth: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => database_url_from_parts()?,
        };

        let secret = std::env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?;

        let session = SessionConfig {
            secret,
            ttl_minutes: env_parse("SESSION_TTL_MINUTES", 60 * 24)?,
            backend: match std::env::var("SESSION_BACKEND") {
                Ok(raw) => SessionBackend::parse(&raw)?,
                Err(_) => SessionBackend::Postgres,
            },
            cookie_secure: env_flag("COOKIE_SECURE"),
        };
        session.validate()?;

        Ok(Self {
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10)?,
            session,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT", 3000)?,
            public_dir: std::env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".into()),
            tasks_list_legacy_query_auth: env_flag("TASKS_LIST_LEGACY_QUERY_AUTH"),
        })
    }
}

fn database_url_from_parts() -> anyhow::Result<String> {
    let host = std::env::var("DB_HOST").context("DATABASE_URL or DB_HOST must be set")?;
    let port = std::env::var("DB_PORT").unwrap_or_else(|_| "5432".into());
    let user = std::env::var("DB_USER").context("DB_USER must be set")?;
    let password = std::env::var("DB_PASSWORD").unwrap_or_default();
    let name = std::env::var("DB_NAME").context("DB_NAME must be set")?;
    Ok(format!("postgres://{user}:{password}@{host}:{port}/{name}"))
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_backend_parses_known_names() {
        assert_eq!(SessionBackend::parse("postgres").unwrap(), SessionBackend::Postgres);
        assert_eq!(SessionBackend::parse(" PG ").unwrap(), SessionBackend::Postgres);
        assert_eq!(SessionBackend::parse("Memory").unwrap(), SessionBackend::Memory);
        assert!(SessionBackend::parse("redis").is_err());
    }

    fn session(secret: &str, ttl_minutes: i64) -> SessionConfig {
        SessionConfig {
            secret: secret.into(),
            ttl_minutes,
            backend: SessionBackend::Memory,
            cookie_secure: false,
        }
    }

    #[test]
    fn session_config_bounds() {
        let long = "s".repeat(MIN_SESSION_SECRET_LEN);
        assert!(session(&long, 1).validate().is_ok());
        assert!(session(&long, MAX_SESSION_TTL_MINUTES).validate().is_ok());

        assert!(session(&long, 0).validate().is_err());
        assert!(session(&long, -5).validate().is_err());
        assert!(session(&long, MAX_SESSION_TTL_MINUTES + 1).validate().is_err());
        assert!(session(&long, i64::MAX).validate().is_err());
        assert!(session("too-short", 60).validate().is_err());
        assert!(session(&" ".repeat(80), 60).validate().is_err());
    }

    #[test]
    fn env_parse_falls_back_to_default_when_unset() {
        let v: u16 = env_parse("TODOSYS_TEST_SURELY_UNSET_PORT", 3000).unwrap();
        assert_eq!(v, 3000);
        assert!(!env_flag("TODOSYS_TEST_SURELY_UNSET_FLAG"));
    }
}
