use std::sync::Arc;
use std::time::Duration;

use movie_recommender::{
    config::Config,
    routes::{create_router, AppState},
    services::Catalog,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_recommender=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let catalog = Catalog::load(&config.movies_path, &config.posters_path)?;
    if catalog.is_empty() {
        anyhow::bail!("catalog at {} has no items with posters", config.movies_path);
    }

    let state = Arc::new(AppState::from_config(&config, catalog)?);

    let sessions = state.sessions.clone();
    let sweep_every = Duration::from_secs(config.session_ttl_secs.clamp(1, 300));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            sessions.purge_expired().await;
        }
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
