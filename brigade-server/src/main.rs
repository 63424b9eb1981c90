//! brigade-server — asynchronous restaurant order-fulfillment pipeline
//!
//! One binary hosting four service modes:
//! - `order-service`: validates and persists orders, dispatches work
//! - `kitchen-worker`: consumes work and drives the cooking lifecycle
//! - `tracking-service`: read-only order/worker queries
//! - `notification-relay`: renders broadcast status events
//!
//! All durable cross-process state lives in PostgreSQL; work routing
//! and notification fanout go through NATS JetStream.

mod api;
mod config;
mod db;
mod error;
mod kitchen;
mod messaging;
mod notification;
mod services;
mod state;

use clap::{Parser, Subcommand};
use shared::models::OrderType;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use config::Config;
use kitchen::KitchenWorker;
use notification::NotificationRelay;
use state::{OrderState, TrackingState};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "brigade-server", version, about = "Restaurant order-fulfillment services")]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

/// Service modes — one process runs exactly one mode
#[derive(Subcommand)]
enum Mode {
    /// HTTP order intake
    OrderService {
        #[arg(long, default_value_t = 3000)]
        port: u16,
        /// Maximum concurrent in-flight submissions
        #[arg(long, default_value_t = 50)]
        max_concurrent: usize,
    },
    /// Fulfillment worker
    KitchenWorker {
        /// Unique worker name; duplicate online names are rejected
        #[arg(long)]
        worker_name: String,
        /// Comma-separated order-type specializations; empty handles all
        #[arg(long, value_delimiter = ',')]
        order_types: Vec<OrderType>,
        /// Heartbeat interval in seconds
        #[arg(long, default_value_t = 30)]
        heartbeat_interval: u64,
        /// Maximum unacknowledged deliveries held at once
        #[arg(long, default_value_t = 1)]
        prefetch: usize,
    },
    /// Read-only tracking API
    TrackingService {
        #[arg(long, default_value_t = 3002)]
        port: u16,
    },
    /// Fanout notification consumer
    NotificationRelay {
        /// Consumer group name; every group receives every notification
        #[arg(long, default_value = "notifications")]
        group: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brigade_server=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(Config::from_env()?);

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone());

    match cli.mode {
        Mode::OrderService {
            port,
            max_concurrent,
        } => run_order_service(config, port, max_concurrent, shutdown).await,
        Mode::KitchenWorker {
            worker_name,
            order_types,
            heartbeat_interval,
            prefetch,
        } => {
            run_kitchen_worker(
                config,
                worker_name,
                order_types,
                Duration::from_secs(heartbeat_interval),
                prefetch.max(1),
                shutdown,
            )
            .await
        }
        Mode::TrackingService { port } => run_tracking_service(config, port, shutdown).await,
        Mode::NotificationRelay { group } => {
            run_notification_relay(config, group, shutdown).await
        }
    }
}

async fn run_order_service(
    config: Arc<Config>,
    port: u16,
    max_concurrent: usize,
    shutdown: CancellationToken,
) -> Result<(), BoxError> {
    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;
    tracing::info!("connected to PostgreSQL, migrations applied");

    let context = messaging::connect(&config).await?;
    tracing::info!("connected to NATS, topology declared");

    let publisher = messaging::Publisher::new(context);
    let state = OrderState::new(config, pool, publisher, max_concurrent);
    tracing::info!(port, max_concurrent, "order service starting");
    serve(api::order_router(state), port, "order-service", shutdown).await
}

async fn run_tracking_service(
    config: Arc<Config>,
    port: u16,
    shutdown: CancellationToken,
) -> Result<(), BoxError> {
    let pool = db::connect(&config.database_url).await?;
    tracing::info!("connected to PostgreSQL");

    let state = TrackingState::new(config, pool);
    tracing::info!(port, "tracking service starting");
    serve(api::tracking_router(state), port, "tracking-service", shutdown).await
}

async fn run_kitchen_worker(
    config: Arc<Config>,
    worker_name: String,
    order_types: Vec<OrderType>,
    heartbeat_interval: Duration,
    prefetch: usize,
    shutdown: CancellationToken,
) -> Result<(), BoxError> {
    let pool = db::connect(&config.database_url).await?;
    tracing::info!("connected to PostgreSQL");

    let context = messaging::connect(&config).await?;
    tracing::info!("connected to NATS, topology declared");

    KitchenWorker::new(
        worker_name,
        order_types,
        heartbeat_interval,
        prefetch,
        pool,
        context,
        config,
        shutdown,
    )
    .run()
    .await
}

async fn run_notification_relay(
    config: Arc<Config>,
    group: String,
    shutdown: CancellationToken,
) -> Result<(), BoxError> {
    let context = messaging::connect(&config).await?;
    tracing::info!("connected to NATS, topology declared");

    NotificationRelay::new(group, context, config, shutdown)
        .run()
        .await
}

/// Window to drain in-flight requests after the shutdown signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

async fn serve(
    router: axum::Router,
    port: u16,
    service: &str,
    shutdown: CancellationToken,
) -> Result<(), BoxError> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "{service} listening");

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned());

    tokio::select! {
        result = server => {
            result?;
        }
        _ = async { shutdown.cancelled().await; tokio::time::sleep(SHUTDOWN_GRACE).await } => {
            tracing::warn!("shutdown grace period elapsed, closing remaining connections");
        }
    }

    tracing::info!("{service} stopped gracefully");
    Ok(())
}

/// Cancel the shared shutdown scope on SIGINT/SIGTERM.
fn spawn_signal_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            let _ = tokio::signal::ctrl_c().await;
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
        tracing::info!("shutdown signal received");
        shutdown.cancel();
    });
}
