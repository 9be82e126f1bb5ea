use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub user_ttl_minutes: i64,
    pub admin_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Where verification redirects land.
    pub frontend_url: String,
    /// Externally reachable address of this API, used to build verification links.
    pub public_base_url: String,
    pub slack_webhook_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "talentboard".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "talentboard-api".into()),
            user_ttl_minutes: env_minutes("JWT_USER_TTL_MINUTES", 60),
            admin_ttl_minutes: env_minutes("JWT_ADMIN_TTL_MINUTES", 60 * 24),
        };

        Ok(Self {
            database_url,
            jwt,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:4200".into()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            slack_webhook_url: std::env::var("SLACK_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        })
    }
}

/// Longest accepted token lifetime: one year.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

fn env_minutes(key: &str, default: i64) -> i64 {
    parse_minutes(std::env::var(key).ok().as_deref(), default)
}

fn parse_minutes(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| (1..=MAX_TTL_MINUTES).contains(v))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_minutes_fall_back_outside_the_accepted_range() {
        assert_eq!(parse_minutes(None, 60), 60);
        assert_eq!(parse_minutes(Some("15"), 60), 15);
        assert_eq!(parse_minutes(Some("0"), 60), 60);
        assert_eq!(parse_minutes(Some("-5"), 60), 60);
        assert_eq!(parse_minutes(Some("soon"), 60), 60);
        assert_eq!(parse_minutes(Some("9223372036854775807"), 60), 60);
        assert_eq!(parse_minutes(Some("525600"), 60), MAX_TTL_MINUTES);
    }
}
