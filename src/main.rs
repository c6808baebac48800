use std::sync::Arc;
use std::time::Duration;

use threat_feed::aggregator::Aggregator;
use threat_feed::client::FeedClient;
use threat_feed::config::Config;
use threat_feed::poller::{FeedPoller, NewsSource};
use threat_feed::routes::{self, AppState};
use threat_feed::translate::GoogleTranslate;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "threat_feed=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("THREAT_FEED_CONFIG").unwrap_or_else(|_| "news.toml".to_string());
    let config = Config::load(&config_path)?.with_env_credentials();
    let refresh_period = config.refresh_period()?;
    info!(
        "Loaded configuration from {} (refresh every {} min)",
        config_path, config.refresh_interval
    );

    let aggregator = Arc::new(Aggregator::new(&config)?);

    // Poll through the feed endpoint when one is configured
    let source: Arc<dyn NewsSource> = match &config.feed_endpoint {
        Some(endpoint) => {
            info!("Feed poller reading from {}", endpoint);
            let client = FeedClient::new(
                endpoint.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )?;
            Arc::new(client) as Arc<dyn NewsSource>
        }
        None => aggregator.clone() as Arc<dyn NewsSource>,
    };

    let poller = Arc::new(FeedPoller::new(source, config.fallback_link.clone()));
    let poller_task = poller.start(refresh_period);

    // Create app state
    let state = Arc::new(AppState {
        aggregator,
        poller,
        translator: Arc::new(GoogleTranslate::default()),
        refresh_interval: refresh_period,
    });

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server starting on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    poller_task.stop().await;
    info!("Shut down");

    Ok(())
}
