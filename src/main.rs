use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;

use support_router::adapters::ai::OpenAIProvider;
use support_router::adapters::http::app_router;
use support_router::adapters::postgres::PostgresConversationStore;
use support_router::adapters::storage::InMemoryConversationStore;
use support_router::app::{self, build_gateway, Dependencies};
use support_router::application::support::Collaborators;
use support_router::config::{AppConfig, ConfigError, DatabaseConfig, ValidationError};
use support_router::domain::routing::ConfigurationError;
use support_router::ports::{AIError, ConversationStore};
use support_router::telemetry;

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid handler configuration: {0}")]
    Handlers(#[from] ConfigurationError),

    #[error("language model provider could not be created: {0}")]
    Provider(#[from] AIError),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migrations failed: {0}")]
    Migrations(#[from] sqlx::migrate::MigrateError),

    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("support-router: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("support-router: invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    telemetry::init(&config.server);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    let registry = Arc::new(config.handlers.registry()?);

    let catalog = Arc::new(config.catalog.load());
    let collaborators = Collaborators {
        products: catalog.clone(),
        reviews: catalog.clone(),
        orders: catalog,
    };

    let store = open_store(config.database.as_ref()).await?;

    let openai = config
        .ai
        .openai()
        .ok_or(ConfigError::from(ValidationError::MissingRequired("OPENAI_API_KEY")))?;
    let provider = Arc::new(OpenAIProvider::new(openai)?);

    let deps = Dependencies::with_llm_classifier(store, collaborators, provider, &config.ai);
    let gateway = build_gateway(registry, deps, &config.session, config.ai.reply_temperature);

    let app = app_router(gateway.clone(), &config.server);
    let addr = config.server.socket_addr().map_err(ConfigError::from)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(app::shutdown_on(ctrl_c(), gateway))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn open_store(database: Option<&DatabaseConfig>) -> Result<Arc<dyn ConversationStore>, StartupError> {
    let Some(database) = database else {
        tracing::warn!("No database configured; conversation history will not survive restarts");
        return Ok(Arc::new(InMemoryConversationStore::new()));
    };

    let pool = database.pool_options().connect(&database.url).await?;
    if database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }
    tracing::info!(max_connections = database.max_connections, "Using PostgreSQL conversation store");
    Ok(Arc::new(PostgresConversationStore::new(pool)))
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
