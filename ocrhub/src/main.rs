use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use ocrhub::api::{create_router, AppState};
use ocrhub::config::Config;
use ocrhub::device::DeviceConfig;
use ocrhub::ocr::{Availability, Engine, NativeBackend, OcrGate, OcrService};

/// How long in-flight jobs may keep the process alive after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "ocrhub")]
#[command(about = "HTTP front door for easyocr, Tesseract, PaddleOCR and Surya")]
struct Args {
    /// Interface to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Enable the denoise/sharpen/binarize pipeline (overrides OCR_PREPROCESS)
    #[arg(long)]
    preprocess: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ocrhub=info,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.preprocess {
        config.ocr.preprocess = true;
    }

    let device = DeviceConfig::detect(config.ocr.use_gpu);
    tracing::info!(
        gpu_requested = device.gpu_requested,
        gpu_detected = device.gpu_detected,
        "Device configuration resolved"
    );

    tracing::info!("Initializing OCR engines...");
    let backend = Arc::new(NativeBackend::new(&config.engines));
    let gate = OcrGate::new(
        config.ocr.max_concurrency,
        config.ocr.queue_timeout_secs.map(Duration::from_secs),
    );
    let ocr = OcrService::new(backend, gate, device, config.ocr.preprocess);

    for engine in Engine::ALL {
        if let Availability::Unavailable(reason) = ocr.availability(engine) {
            tracing::warn!("{} unavailable - requests for it will fail: {}", engine, reason);
        }
    }
    tracing::info!(
        "OCR gate allows {} concurrent jobs, preprocessing {}",
        ocr.gate().capacity(),
        if ocr.preprocessing_enabled() { "on" } else { "off" }
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, ocr);
    let app = create_router(state);

    let cancel_token = CancellationToken::new();

    let watchdog = cancel_token.child_token();
    tokio::spawn(async move {
        watchdog.cancelled().await;
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        tracing::warn!(
            "OCR jobs still running {}s after shutdown signal, exiting",
            SHUTDOWN_GRACE.as_secs()
        );
        std::process::exit(1);
    });

    tracing::info!("ocrhub starting on http://{}", addr);
    tracing::info!("  Test page:    http://{}/index.html", addr);
    tracing::info!("  Health check: http://{}/health", addr);
    tracing::info!("  API docs:     http://{}/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight OCR requests...");
    cancel_token.cancel();
}
