use std::env;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,

    // Offset of the calendar the diary runs on (KST by default)
    pub utc_offset_secs: i32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_access_ttl_secs: env::var("JWT_ACCESS_TTL_SECS")
                .unwrap_or_else(|_| "900".into())
                .parse()
                .expect("JWT_ACCESS_TTL_SECS must be a number"),

            utc_offset_secs: env::var("UTC_OFFSET_SECS")
                .unwrap_or_else(|_| "32400".into())
                .parse()
                .expect("UTC_OFFSET_SECS must be a number"),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Calendar date of `now` in the service's configured offset.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        match FixedOffset::east_opt(self.utc_offset_secs) {
            Some(offset) => now.with_timezone(&offset).date_naive(),
            None => {
                tracing::warn!(
                    utc_offset_secs = self.utc_offset_secs,
                    "UTC offset out of range, falling back to UTC"
                );
                now.date_naive()
            }
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }
}
