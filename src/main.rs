use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use filter_search::api;
use filter_search::catalog::Catalog;
use filter_search::service::{HttpSearchService, MemorySearchService, SearchService};
use filter_search::AppState;
use metrics_exporter_prometheus::PrometheusBuilder;

#[derive(Parser)]
#[command(
    name = "filter-search",
    about = "Structured filter-query editing API for alert, event, incident and action search",
    version
)]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value = "3000", env = "PORT")]
    port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "BIND_ADDRESS")]
    bind: String,

    /// Base URL of the history/favorite/validation backend. Without it an
    /// in-memory backend is used.
    #[arg(long, env = "BACKEND_URL")]
    backend_url: Option<String>,

    /// JSON file mapping field ids to display names
    #[arg(long, env = "FIELD_LABELS")]
    labels: Option<PathBuf>,

    /// Insert suggestion ids instead of display names
    #[arg(long, env = "FILL_ID")]
    fill_id: bool,

    /// Show field ids as display names, ignoring --labels
    #[arg(long, env = "ENGLISH_LABELS")]
    english: bool,

    /// Expose Prometheus metrics on /metrics
    #[arg(long, env = "ENABLE_METRICS")]
    metrics: bool,

    /// Timeout for backend requests, in seconds
    #[arg(long, default_value = "30", env = "REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let labels = match (&cli.labels, cli.english) {
        (Some(path), false) => Catalog::load_labels(path)?,
        _ => HashMap::new(),
    };
    let catalog = Catalog::with_labels(&labels).with_fill_id(cli.fill_id);

    let (service, backend) = match &cli.backend_url {
        Some(url) => {
            let client = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(cli.request_timeout_secs))
                .build()?;
            tracing::info!(url = %url, "using remote search backend");
            let service: Arc<dyn SearchService> = Arc::new(HttpSearchService::new(client, url));
            (service, "http")
        }
        None => {
            tracing::info!("no backend configured, using in-memory search backend");
            let service: Arc<dyn SearchService> = Arc::new(MemorySearchService::new());
            (service, "memory")
        }
    };

    let metrics_handle = if cli.metrics {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    let state = Arc::new(AppState::new(catalog, service, backend));

    let app = api::router(state, metrics_handle);
    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;
    tracing::info!(address = %addr, "starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
