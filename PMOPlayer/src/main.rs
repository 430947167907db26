use pmoconfig::Config;
use pmometing::{MetingClient, PlaylistSource};
use pmoplayer::{LoadOutcome, MusicPlayer, collect_routes, init_logging, router};
use std::sync::Arc;
use tracing::{info, warn};

/// Address to serve the build assets on, e.g. `127.0.0.1:4000`
const ENV_SERVE: &str = "PMOPLAYER_SERVE";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ========== Configuration ==========
    let config = Config::load_config("")?;
    let music = config.music()?;
    init_logging(&music.logger);
    info!(config_dir = %config.config_dir().display(), "PMOPlayer starting");

    // ========== Playlist ==========
    let client = MetingClient::from_config(&music)?;
    info!(url = %client.playlist_url()?, "Meting playlist");

    let source = PlaylistSource::from_config(Arc::new(client), &music);
    let player = MusicPlayer::new(source, music.clone());

    match player.init().await {
        LoadOutcome::Acquired { fallback: None } => info!("✅ Playlist ready"),
        LoadOutcome::Acquired {
            fallback: Some(kind),
        } => warn!(%kind, "⚠️ Aggregator unavailable, using sample songs"),
        other => warn!(?other, "Initial load did not complete"),
    }

    println!("{}", serde_json::to_string_pretty(&player.snapshot())?);

    // ========== Assets ==========
    let Ok(addr) = std::env::var(ENV_SERVE) else {
        return Ok(());
    };

    let routes = collect_routes(&music.assets.dist_dir);
    info!(count = routes.len(), dir = %music.assets.dist_dir.display(), "Serving build assets");
    for route in &routes {
        info!("  - /{}", route.route);
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "🌐 Listening");
    axum::serve(listener, router(routes))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Ctrl-C received, shutting down");
        })
        .await?;

    Ok(())
}
