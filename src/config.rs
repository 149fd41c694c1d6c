use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Where appointment documents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentBackend {
    Postgres,
    /// Process memory; everything is lost on restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Offset of the shop's wall clock; decides which day is "today" on the dashboard.
    pub utc_offset_hours: i8,
    pub document_backend: DocumentBackend,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "barbearia".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "barbearia-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let utc_offset_hours = std::env::var("APP_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|v| v.parse::<i8>().ok())
            .filter(|h| (-23..=23).contains(h))
            .unwrap_or(-3);
        let document_backend = match std::env::var("DOCUMENT_STORE").as_deref() {
            Ok("memory") => DocumentBackend::Memory,
            Ok("postgres") | Err(_) => DocumentBackend::Postgres,
            Ok(other) => anyhow::bail!("unknown DOCUMENT_STORE {other:?}"),
        };
        Ok(Self {
            database_url,
            jwt,
            utc_offset_hours,
            document_backend,
        })
    }

    pub fn utc_offset(&self) -> time::UtcOffset {
        time::UtcOffset::from_hms(self.utc_offset_hours, 0, 0).unwrap_or(time::UtcOffset::UTC)
    }
}
