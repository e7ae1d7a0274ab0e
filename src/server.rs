//! Server initialization and startup logic for indexsync.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use indexsync_api::{ApiServer, AppState, ServerConfig};
use indexsync_config::{Config, ConfigLoader, LoggingConfig};
use indexsync_core::{Database, Extension, ExtensionContext};
use indexsync_full_text_search::FullTextSearchExtension;
use indexsync_vector_search::VectorSearchExtension;

use crate::register::{build_provider, full_text_search_config, vector_search_config};

/// Initialize tracing with console output and, when `logging.dir` is set,
/// a daily-rotated log file.
///
/// `RUST_LOG` takes precedence over `logging.level`.
pub(crate) fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = match &config.dir {
        Some(dir) => {
            let log_dir = ConfigLoader::expand_path(dir);
            std::fs::create_dir_all(&log_dir)
                .with_context(|| format!("creating log directory {}", log_dir))?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("indexsync")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&log_dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Flushes pending lines when dropped at exit.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(file_layer)
        .init();

    Ok(())
}

/// Open the database, initialize the search extensions and serve the API
/// until a shutdown signal arrives.
pub(crate) async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Starting indexsync v{}", env!("CARGO_PKG_VERSION"));

    let db_path = ConfigLoader::expand_path(&config.database.path);
    if let Some(parent) = Path::new(&db_path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating database directory {}", parent.display()))?;
    }
    let database = Database::open(&db_path, config.database.busy_timeout_ms)
        .await
        .with_context(|| format!("opening database {}", db_path))?;
    match database.vec_version().await {
        Ok(version) => info!("sqlite-vec {}", version),
        Err(e) => anyhow::bail!("sqlite-vec is not available: {}", e),
    }

    let provider = build_provider(&config.provider)?;
    let ctx = ExtensionContext::new(database);

    // Vector search first: it creates the tracked collections that the
    // full-text mirrors may reference.
    let mut vector = VectorSearchExtension::new(provider.clone(), vector_search_config(&config));
    vector
        .initialize(ctx.clone())
        .await
        .context("initializing vector search")?;
    info!(
        "Vector search tracking {} collection(s)",
        config.vector_search.collections.len()
    );

    let mut full_text = FullTextSearchExtension::new(full_text_search_config(&config));
    full_text
        .initialize(ctx.clone())
        .await
        .context("initializing full-text search")?;
    info!(
        "Full-text search tracking {} collection(s)",
        config.full_text_search.collections.len()
    );

    let state = AppState::new(&ctx, provider)
        .with_vector_search(vector.search())
        .with_full_text_search(full_text.search())
        .with_global_store(vector.global());

    let server = ApiServer::new(
        ServerConfig::new(config.server.host.clone(), config.server.port),
        Arc::new(state),
    );
    info!("Serving on http://{}", server.addr());
    server.run().await.context("API server failed")?;

    full_text.shutdown().await.ok();
    vector.shutdown().await.ok();
    info!("indexsync stopped");
    Ok(())
}
