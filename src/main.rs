//! Home price API entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use home_price_api::api::{create_router, AppState};
use home_price_api::artifacts::schema::FIXED_FEATURES;
use home_price_api::artifacts::{ArtifactPaths, ArtifactStore};
use home_price_api::config::Config;
use home_price_api::metrics;
use home_price_api::predict::{PredictionService, PriceQuery};
use home_price_api::utils::shutdown_signal;

/// Home price estimation service.
#[derive(Parser, Debug)]
#[command(name = "home-price-api")]
#[command(about = "Serve residential price estimates from a trained regression model")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Load the artifacts and print a summary.
    CheckArtifacts,

    /// Print the known location names.
    Locations,

    /// Estimate a single price without starting the server.
    Predict {
        /// Location name or column key.
        #[arg(long)]
        location: String,

        /// Area in square feet.
        #[arg(long)]
        sqft: f64,

        /// Bathroom count.
        #[arg(long)]
        bath: u64,

        /// Bedroom count.
        #[arg(long)]
        bhk: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load_validated()?;

    // Initialize logging
    let filter = if args.verbose || config.verbose {
        EnvFilter::new("home_price_api=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Handle subcommands
    match args.command {
        Some(Command::Serve { port }) => cmd_serve(config, port.or(args.port)).await,
        Some(Command::CheckArtifacts) => cmd_check_artifacts(&config),
        Some(Command::Locations) => cmd_locations(&config),
        Some(Command::Predict {
            location,
            sqft,
            bath,
            bhk,
        }) => cmd_predict(&config, location, sqft, bath, bhk),
        None => cmd_serve(config, args.port).await,
    }
}

/// Load artifacts into a fresh store. Failure here is fatal.
fn load_store(config: &Config) -> home_price_api::Result<Arc<ArtifactStore>> {
    let store = Arc::new(ArtifactStore::new(ArtifactPaths::from(config)));
    store.load().map_err(|e| {
        error!("Failed to load artifacts: {}", e);
        e
    })?;
    Ok(store)
}

/// Run the HTTP server.
async fn cmd_serve(mut config: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port_override {
        config.port = port;
    }

    // Initialize metrics
    let prometheus = match metrics::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Prometheus recorder unavailable: {}", e);
            None
        }
    };

    // Artifacts must be in place before the listener accepts traffic
    info!("Loading artifacts from {}", config.artifacts_dir.display());
    let store = load_store(&config)?;

    let mut app_state = AppState::new(PredictionService::new(store));
    if let Some(handle) = prometheus {
        app_state = app_state.with_metrics(handle);
    }

    let addr: SocketAddr = format!("{}:{}", config.bind_host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Load the artifacts and print a summary.
fn cmd_check_artifacts(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("HOME PRICE API - ARTIFACT CHECK");
    println!("======================================================================");
    println!("  Schema: {}", config.schema_path().display());
    println!("  Model:  {}", config.model_path().display());

    let store = load_store(config)?;
    let artifacts = store.snapshot()?;
    let schema = artifacts.schema();

    println!("----------------------------------------------------------------------");
    println!("  Columns: {}", schema.len());
    println!("  Numeric features: {}", schema.columns()[..FIXED_FEATURES].join(", "));
    println!("  Locations: {}", schema.locations().len());
    match artifacts.model().num_features() {
        Some(n) => println!("  Model features: {}", n),
        None => println!("  Model features: not recorded"),
    }
    println!("======================================================================");
    println!("ARTIFACT CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Print the known location names.
fn cmd_locations(config: &Config) -> anyhow::Result<()> {
    let service = PredictionService::new(load_store(config)?);
    for location in service.list_locations()? {
        println!("{}", location);
    }
    Ok(())
}

/// Estimate one price in-process.
fn cmd_predict(
    config: &Config,
    location: String,
    sqft: f64,
    bath: u64,
    bhk: u64,
) -> anyhow::Result<()> {
    let service = PredictionService::new(load_store(config)?);
    let query = PriceQuery {
        location,
        total_sqft: sqft,
        bath,
        bhk,
    };

    let price = estimate(&service, &query)?;
    println!("{:.2}", price);
    Ok(())
}

fn estimate(service: &PredictionService, query: &PriceQuery) -> home_price_api::Result<f64> {
    let features = service.encode(query)?;
    if features.is_baseline() {
        warn!("Location {:?} is not in the schema; using baseline", query.location);
    }
    Ok(service.estimate_price(query)?)
}
