use clap::Parser;
use pitch_core::PitchConfig;
use pitch_server::http::{start_http_server, HttpState};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "pitch.toml")]
    config: String,

    /// Check the configured store and exit
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience, production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match PitchConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let state = match HttpState::from_config(&config).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialise pitch services: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match state.store.health().await {
            Ok(v) => println!("✅ {} store connected: {}", state.store.name(), v),
            Err(e) => {
                println!("❌ {} store check failed: {}", state.store.name(), e);
                std::process::exit(1);
            }
        }
        println!("✅ Generator backend: {}", state.generator.name());
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    start_http_server(state, config.http, tx.subscribe()).await?;

    Ok(())
}
