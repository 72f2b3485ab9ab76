/// Lyre Server - playback host with LAN remote control
use clap::{Parser, Subcommand};
use lyre_core::{Catalog, JsonCatalog};
use lyre_playback::{KeyValueStore, PlaybackEngine};
use lyre_server::{
    api, catalog_durations, config::ServerConfig, net, AppState, FileStore, HeadlessBackend,
    LibraryCatalog, PeerRegistry, Session,
};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lyre-server")]
#[command(about = "Lyre playback host with LAN remote control", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./lyre.toml if present)
    #[arg(short, long, global = true, env = "LYRE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the playback host and remote gateway
    Serve,
    /// List tracks in the library catalog
    ListTracks,
    /// List playlists in the library catalog
    ListPlaylists,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lyre_server=info,lyre_playback=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Serve => serve(config).await?,
        Commands::ListTracks => list_tracks(&config)?,
        Commands::ListPlaylists => list_playlists(&config)?,
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Lyre server");
    tracing::info!("Library: {:?}", config.storage.library_dir);
    tracing::info!("State file: {:?}", config.storage.state_file);

    let catalog = Arc::new(LibraryCatalog::new(Arc::new(JsonCatalog::new(
        &config.storage.library_dir,
    ))));
    if let Err(e) = catalog.reload().await {
        tracing::warn!("Library not loaded, starting empty: {}", e);
    }
    let store = Arc::new(FileStore::open(&config.storage.state_file).await?);
    let peers = Arc::new(PeerRegistry::new());

    // Session loop owns the engine from here on
    let backend = HeadlessBackend::new(
        config.playback.progress_interval(),
        catalog_durations(catalog.clone()),
    );
    let engine_config = config.playback.engine_config();
    let kv_store: Arc<dyn KeyValueStore> = store.clone();
    let (session, session_task) = Session::spawn(Arc::clone(&peers), move |listener| {
        PlaybackEngine::new(engine_config, Box::new(backend), listener, kv_store)
    });

    let app_state = AppState::new(session.clone(), catalog, peers);
    let app = api::create_router(app_state, &config.remote);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;

    tracing::info!("Server listening on {}", bound);
    tracing::info!(
        "Remote control available at http://{}:{}",
        net::local_ipv4(),
        bound.port()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session.shutdown().await?;
    session_task.await?;
    store.flush().await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn list_tracks(config: &ServerConfig) -> anyhow::Result<()> {
    let catalog = JsonCatalog::new(&config.storage.library_dir);
    let tracks = catalog.list_tracks()?;

    println!("Tracks ({}):", tracks.len());
    for track in tracks {
        println!(
            "  {} - {} [{}]",
            track.display_title(),
            track.display_artist(),
            track.url
        );
    }

    Ok(())
}

fn list_playlists(config: &ServerConfig) -> anyhow::Result<()> {
    let catalog = JsonCatalog::new(&config.storage.library_dir);
    let playlists = catalog.list_playlists()?;

    println!("Playlists ({}):", playlists.len());
    for playlist in playlists {
        println!("  {} ({} tracks)", playlist.name, playlist.music_list.len());
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        },
        () = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        },
    }
}
