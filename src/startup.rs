//! Application startup and lifecycle management.

use crate::config::ChatConfig;
use crate::error::AppError;
use crate::handlers::chat::chat;
use crate::handlers::health::{health_check, metrics_handler, readiness_check};
use crate::services::providers::openai::{OpenAiConfig, OpenAiTextProvider};
use crate::services::providers::TextProvider;
use crate::services::store::InvoiceStore;
use crate::services::Database;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ChatConfig,
    pub store: Arc<dyn InvoiceStore>,
    pub text_provider: Arc<dyn TextProvider>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application against PostgreSQL and the OpenAI provider.
    pub async fn build(config: ChatConfig) -> Result<Self, AppError> {
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            e
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            e
        })?;

        let openai_config = OpenAiConfig {
            api_key: config.openai.api_key.clone(),
            model: config.openai.model.clone(),
        };
        let text_provider: Arc<dyn TextProvider> = Arc::new(OpenAiTextProvider::new(openai_config));

        tracing::info!(
            model = %config.openai.model,
            "Initialized OpenAI text provider"
        );

        Self::build_with_state(config, Arc::new(db), text_provider).await
    }

    /// Build with injected store and provider; tests pass doubles here.
    pub async fn build_with_state(
        config: ChatConfig,
        store: Arc<dyn InvoiceStore>,
        text_provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let state = AppState {
            config: config.clone(),
            store,
            text_provider,
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("cfdi-chat-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Build the router for this application's state.
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/api/chat", post(chat))
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .route("/metrics", get(metrics_handler))
            .layer(TraceLayer::new_for_http())
            // The chat UI is a separate browser app
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = Self::router(self.state);
        axum::serve(self.listener, router).await
    }
}
