//! Test utilities for centime-core
//!
//! This module provides testing infrastructure including a mock Ollama
//! server that can be used for development and integration tests.

use axum::{
    extract::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3:8b".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
///
/// Answers mapping prompts by recognizing well-known statement layouts in
/// the prompt text. Unknown layouts get an all-null mapping, and a prompt
/// mentioning "Phantom" exercises the hallucination path by naming a column
/// that does not exist.
async fn handle_generate(Json(request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    let prompt = &request.prompt;

    let response = if prompt.contains("Buchungsdatum") {
        // German bank export layout
        r#"{"date":"Buchungsdatum","amount":"Betrag","currency":"Währung","description":"Buchungstext","recipient":"Empfänger"}"#
            .to_string()
    } else if prompt.contains("Transaction Date") {
        // US card export layout
        r#"{"date":"Transaction Date","amount":"Amount","currency":null,"description":"Description","recipient":null}"#
            .to_string()
    } else if prompt.contains("Phantom") {
        r#"{"date":"Phantom Column","amount":null,"currency":null,"description":null,"recipient":null}"#
            .to_string()
    } else {
        r#"{"date":null,"amount":null,"currency":null,"description":null,"recipient":null}"#
            .to_string()
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[allow(dead_code)]
    #[serde(default)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}
