// Mash Notes - journal storage core
// Entry point: opens the configured database and prints profile statistics

use mashnotes::app::AppState;
use mashnotes::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mashnotes=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Mash Notes");

    let state = AppState::initialize(AppConfig::from_env()).await?;

    let weekdays = state.queries.count_by_weekday().await?;
    let moods = state.queries.count_by_mood(None).await?;

    let stats = serde_json::json!({
        "weekdays": weekdays,
        "moods": moods,
    });
    println!("{}", serde_json::to_string_pretty(&stats)?);

    state.shutdown().await;

    Ok(())
}
