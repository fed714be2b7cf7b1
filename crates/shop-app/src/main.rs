use shop_hex::cache::ResponseCache;
use shop_hex::config::Config;
use shop_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use shop_hex::payment::SimulatedPayment;
use shop_hex::security::{SaltedSha256, SessionTokens};
use shop_repo::{build_repo, Repo};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    tracing::info!(backend = repo.backend(), "store ready");

    let cache = Arc::new(ResponseCache::new());
    let sweep_every = Duration::from_secs(config.cache_sweep_secs);
    let sweeper = cache.spawn_sweeper(sweep_every);
    let tokens = Arc::new(SessionTokens::new(Duration::from_secs(config.token_ttl_secs)));
    let session_sweeper = tokens.spawn_sweeper(sweep_every);

    let state = AppState::new(
        Arc::new(repo),
        cache,
        Arc::new(SimulatedPayment::new(config.payment_success_rate)),
        Arc::new(SaltedSha256),
        tokens,
        config.rate_limit_per_minute,
    );
    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
    };

    let result = HttpServer::new(state, server_cfg).run().await;
    sweeper.abort();
    session_sweeper.abort();
    result
}
