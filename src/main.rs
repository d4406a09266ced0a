use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use file_handoff_bridge::api::handlers::files::{OpenFileRequest, OpenFileResponse};
use file_handoff_bridge::config::BridgeConfig;
use file_handoff_bridge::infrastructure::{staging, updater};
use file_handoff_bridge::services::bridge::FileBridge;
use file_handoff_bridge::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port of the local bridge service (overrides BRIDGE_PORT)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the bridge. References given here are staged before any receiver connects.
    Serve {
        references: Vec<String>,
    },
    /// Hand a file to a running bridge, as an OS "open with" handler would.
    Open { reference: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "file_handoff_bridge=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = BridgeConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }

    match args.command {
        Command::Serve { references } => serve(config, references).await,
        Command::Open { reference } => forward_open(&config, &reference).await,
    }
}

async fn serve(config: BridgeConfig, references: Vec<String>) -> anyhow::Result<()> {
    info!("🚀 Starting file handoff bridge...");

    let intake = staging::setup_intake(&config).await?;
    let update_checker = updater::setup_update_checker(&config);
    let bridge = Arc::new(FileBridge::new(intake, update_checker));

    let staged = bridge.stage_startup_references(&references).await;
    if staged > 0 {
        info!("📥 {} startup file(s) waiting for the application", staged);
    }

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    let app = create_app(AppState { bridge }).layer(trace_layer);
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("✅ Bridge listening on: http://{}", addr);
    info!("📖 Swagger UI documentation: http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Bridge exited cleanly.");
    Ok(())
}

async fn forward_open(config: &BridgeConfig, reference: &str) -> anyhow::Result<()> {
    let url = format!("http://127.0.0.1:{}/files/open", config.port);
    let response = reqwest::Client::new()
        .post(&url)
        .json(&OpenFileRequest {
            reference: reference.to_string(),
        })
        .send()
        .await
        .with_context(|| format!("no bridge reachable at {}", url))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("bridge refused {}: {} {}", reference, status, body);
    }

    let opened: OpenFileResponse = response.json().await?;
    info!(
        "✅ Staged {} as {} ({:?})",
        reference,
        opened.file.staged_path.display(),
        opened.delivery
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
