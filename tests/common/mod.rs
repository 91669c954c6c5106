//! Test helper module for cfdi-chat-service integration tests.
//!
//! Spawns the application on a random port with an injected mock store and
//! mock provider, so the suite runs without PostgreSQL or an API key.

#![allow(dead_code)]

use cfdi_chat_service::config::{ChatConfig, CommonConfig, DatabaseConfig, OpenAiSettings};
use cfdi_chat_service::services::init_metrics;
use cfdi_chat_service::services::providers::mock::MockTextProvider;
use cfdi_chat_service::services::providers::TextProvider;
use cfdi_chat_service::services::store::mock::MockInvoiceStore;
use cfdi_chat_service::services::store::InvoiceStore;
use cfdi_chat_service::startup::Application;
use std::sync::Arc;

pub const TEST_RFC: &str = "AELB5401024Q7";

/// Test application wrapper.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

/// Config with a random port and placeholder backends.
pub fn test_config() -> ChatConfig {
    ChatConfig {
        common: CommonConfig { port: 0 },
        service_name: "cfdi-chat-service-test".to_string(),
        log_level: "warn".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 2,
            min_connections: 0,
        },
        openai: OpenAiSettings {
            api_key: "test-key".to_string(),
            model: "gpt-4o".to_string(),
            max_output_tokens: 2000,
        },
    }
}

impl TestApp {
    /// Spawn with an empty store and an echoing provider.
    pub async fn spawn() -> Self {
        Self::spawn_with(
            Arc::new(MockInvoiceStore::new()),
            Arc::new(MockTextProvider::new(true)),
        )
        .await
    }

    /// Spawn with explicit store/provider doubles.
    pub async fn spawn_with(
        store: Arc<dyn InvoiceStore>,
        text_provider: Arc<dyn TextProvider>,
    ) -> Self {
        init_metrics();

        let app = Application::build_with_state(test_config(), store, text_provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    /// POST a chat request body to /api/chat.
    pub async fn post_chat(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/chat", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute chat request")
    }
}
