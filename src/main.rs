use std::net::SocketAddr;
use std::sync::Arc;

use route_snapshot::api::rest::{AppState, create_api_router};
use route_snapshot::config::{Config, OutputFormat, TableKind};
use route_snapshot::error::AppResult;
use route_snapshot::routes::Snapshot;
use route_snapshot::routes::snapshot::SnapshotAssembler;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &config.config_file {
        tracing::info!("Loaded configuration from: {}", path.display());
    }

    if config.serve {
        return serve(config).await;
    }

    print!("{}", render(&config)?);
    Ok(())
}

/// Take the requested snapshots and render them in the configured format.
fn render(config: &Config) -> AppResult<String> {
    let assembler = SnapshotAssembler::new(&config.paths);
    let tables: Vec<(&str, Snapshot)> = match config.table {
        TableKind::Routes => vec![("routes", assembler.routes())],
        TableKind::Arp => vec![("arp", assembler.arp())],
        TableKind::All => vec![("routes", assembler.routes()), ("arp", assembler.arp())],
    };

    let mut out = String::new();
    match config.format {
        OutputFormat::Json => {
            let value: serde_json::Map<String, serde_json::Value> = tables
                .into_iter()
                .map(|(name, snapshot)| -> AppResult<(String, serde_json::Value)> {
                    Ok((name.to_string(), serde_json::to_value(snapshot)?))
                })
                .collect::<AppResult<_>>()?;
            out.push_str(&serde_json::to_string_pretty(&value)?);
            out.push('\n');
        }
        OutputFormat::Text => {
            for (name, snapshot) in tables {
                out.push_str(&format!("# {} ({} rows)\n", name, snapshot.rows.len()));
                let text = snapshot.to_text();
                if !text.is_empty() {
                    out.push_str(&text);
                    out.push('\n');
                }
            }
        }
    }
    Ok(out)
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port).parse()?;
    let state = Arc::new(AppState::new(config.paths.clone()));
    let app = create_api_router(state);

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  http://{}/api/routes", addr);
    tracing::info!("  GET  http://{}/api/arp", addr);
    tracing::info!("  GET  http://{}/api/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
