use anyhow::Context;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db: DbConfig,
    pub app_host: String,
    pub app_port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source so tests don't touch the process env.
    pub fn from_lookup<F>(raw: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // `DB_USER=` in a .env file means unset, not an empty user name.
        let lookup = |key: &str| raw(key).filter(|v| !v.trim().is_empty());
        let url = lookup("DATABASE_URL");

        // With a full URL the discrete DB_* variables are optional.
        let required = |key: &str| -> anyhow::Result<String> {
            match lookup(key) {
                Some(v) => Ok(v),
                None if url.is_some() => Ok(String::new()),
                None => anyhow::bail!("{key} must be set"),
            }
        };

        let db = DbConfig {
            host: lookup("DB_HOST").unwrap_or_else(|| "localhost".into()),
            port: parse_or(&lookup, "DB_PORT", 5432)?,
            user: required("DB_USER")?,
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            name: required("DB_NAME")?,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            url,
        };

        Ok(Self {
            db,
            app_host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            app_port: parse_or(&lookup, "APP_PORT", 3000)?,
        })
    }
}

impl DbConfig {
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return url.parse().context("parse DATABASE_URL");
        }
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid {key} value {v:?}")),
        None => Ok(default),
    }
}
