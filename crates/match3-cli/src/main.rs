//! Headless match-3 autoplayer.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod autoplay;
mod settings;

use autoplay::Autoplayer;
use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::from_env()?;
    info!(
        seed = ?settings.config.seed,
        width = settings.config.board.width,
        height = settings.config.board.height,
        "Starting match3 autoplayer..."
    );

    let mut player = Autoplayer::new(settings)?;
    let outcome = player.run().await?;

    info!(
        ?outcome,
        score = player.session().score(),
        moves = player.moves(),
        "Round finished"
    );
    Ok(())
}
