//! Order Service entry point
//!
//! # Usage
//!
//! ```bash
//! # In-memory store, spans logged as JSON
//! order-service serve --port 8080
//!
//! # Persistent store, spans exported through OpenTelemetry
//! ORDER_STORE=sled ORDER_STORE_PATH=/var/lib/orders ORDER_TRACER=otel order-service serve
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use order_service::handler::{create_router, AppState};
use order_service::metrics::ServiceMetrics;
use order_service::random::{RandomSource, SeededRandom};
use order_service::repository;
use order_service::telemetry::{init_tracing, LogFormat, TracerSetup};
use order_service::{OrderWorkflow, ServiceConfig, StoreBackend, TracerBackend};

#[derive(Parser)]
#[command(name = "order-service")]
#[command(about = "Order Service - simulated order workflow with span instrumentation")]
#[command(version)]
struct Cli {
    /// Log output format (json, pretty)
    #[arg(long, global = true, default_value = "json", env = "LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "HOST")]
        host: String,

        /// Order store backend (memory, sled)
        #[arg(long, default_value = "memory", env = "ORDER_STORE")]
        store: String,

        /// Directory of the sled store
        #[arg(long, default_value = "./data/orders", env = "ORDER_STORE_PATH")]
        store_path: PathBuf,

        /// Span backend: log, otel, or recording (in-memory only, spans are not exported)
        #[arg(long, default_value = "log", env = "ORDER_TRACER")]
        tracer: TracerBackend,

        /// Seed for simulated delays and failures
        #[arg(long, env = "ORDER_SEED")]
        seed: Option<u64>,

        /// Service name reported on spans and by /health
        #[arg(long, default_value = "order-service", env = "SERVICE_NAME")]
        service_name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Serve {
            port,
            host,
            store,
            store_path,
            tracer,
            seed,
            service_name,
        } => {
            let config = ServiceConfig::builder()
                .host(host)
                .port(port)
                .service_name(service_name)
                .store(StoreBackend::parse(&store, store_path)?)
                .tracer(tracer)
                .seed(seed)
                .build()?;

            serve(config).await?;
        }
    }

    Ok(())
}

async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let addr = config.listen_addr()?;

    let repository = repository::open(&config.store)?;
    let random: Arc<dyn RandomSource> = match config.seed {
        Some(seed) => Arc::new(SeededRandom::from_seed(seed)),
        None => Arc::new(SeededRandom::from_entropy()),
    };
    let metrics = Arc::new(ServiceMetrics::new()?);
    let tracing_setup = TracerSetup::install(config.tracer, &config.service_name);

    let workflow = OrderWorkflow::new(repository, tracing_setup.tracer(), random)
        .with_simulation(config.simulation.clone())?
        .with_metrics(Arc::clone(&metrics));
    let state = Arc::new(AppState::new(workflow, metrics, config.service_name.clone()));
    let router = create_router(state);

    tracing::info!("Starting Order Service on {}", addr);
    tracing::info!(
        "Service: {}, Version: {}, Store: {:?}, Tracer: {:?}",
        config.service_name,
        env!("CARGO_PKG_VERSION"),
        config.store,
        config.tracer
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Order Service stopped");
    tracing_setup.shutdown()?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
