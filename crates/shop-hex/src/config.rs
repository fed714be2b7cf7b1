use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub payment_success_rate: f64,
    pub token_ttl_secs: u64,
    pub rate_limit_per_minute: u32,
    pub cache_sweep_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: "3000".into(),
            database_url: None,
            payment_success_rate: 0.8,
            token_ttl_secs: 24 * 60 * 60,
            rate_limit_per_minute: 10,
            cache_sweep_secs: 60,
        }
    }
}

fn parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let server_port = env::var("SERVER_PORT").unwrap_or(defaults.server_port);
        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());
        let payment_success_rate = parsed("PAYMENT_SUCCESS_RATE", defaults.payment_success_rate)?;
        if !(0.0..=1.0).contains(&payment_success_rate) {
            anyhow::bail!("PAYMENT_SUCCESS_RATE must be within 0.0..=1.0, got {payment_success_rate}");
        }
        let rate_limit_per_minute = parsed("RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute)?;
        if rate_limit_per_minute == 0 {
            anyhow::bail!("RATE_LIMIT_PER_MINUTE must be positive");
        }
        let cache_sweep_secs = parsed("CACHE_SWEEP_SECS", defaults.cache_sweep_secs)?;
        if cache_sweep_secs == 0 {
            anyhow::bail!("CACHE_SWEEP_SECS must be positive");
        }
        Ok(Self {
            server_port,
            database_url,
            payment_success_rate,
            token_ttl_secs: parsed("TOKEN_TTL_SECS", defaults.token_ttl_secs)?,
            rate_limit_per_minute,
            cache_sweep_secs,
        })
    }
}
