use std::sync::Arc;

use clap::Parser;
use thermolog_core::{InsideClient, OutsideClient, ReadingStore, TemperatureSource, ThermologConfig};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use thermolog_server::http::{self, HttpState};
use thermolog_server::query::QueryService;
use thermolog_server::shutdown;
use thermolog_server::subsystems::error_log::ErrorLog;
use thermolog_server::subsystems::sampler::{self, Sampler};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "thermolog.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience, production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match ThermologConfig::load(&args.config) {
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

    // Open the store. This is the only fatal runtime failure.
    let store = match ReadingStore::initialize(&config.database).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open reading store at {}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    if args.health {
        match store.health_check().await {
            Ok(v) => println!("✅ SQLite available: {}", v),
            Err(e) => {
                println!("❌ SQLite check failed: {}", e);
                std::process::exit(1);
            }
        }
        match store.count().await {
            Ok(n) => println!("✅ {} readings stored", n),
            Err(e) => {
                println!("❌ Reading count failed: {}", e);
                std::process::exit(1);
            }
        }
        println!("✅ Thermolog health check passed");
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(shutdown::forward_signal(tokio::signal::ctrl_c(), shutdown_tx));

    // Spawn the sampling loop
    let inside: Arc<dyn TemperatureSource> = Arc::new(InsideClient::new(&config.sources)?);
    let outside: Arc<dyn TemperatureSource> = Arc::new(OutsideClient::new(&config.sources)?);
    let error_log = ErrorLog::new(&config.sampler.error_log_path);
    let sampler = Sampler::new(store.clone(), inside, outside, error_log).await;
    let sampler_handle = tokio::spawn(sampler::run_sampler_loop(
        sampler,
        config.sampler.clone(),
        tx.subscribe(),
    ));

    // Serve the read views in the foreground
    let state = HttpState::new(QueryService::new(store.clone()), &config);
    http::start_http_server(state, &config, tx.subscribe()).await?;

    let _ = sampler_handle.await;
    store.close().await;
    tracing::info!("Thermolog stopped");

    Ok(())
}
