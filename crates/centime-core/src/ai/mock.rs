//! Mock backend for testing
//!
//! Returns a configurable canned response instead of calling a model server.

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AiBackend;

/// Mock text-generation backend
///
/// By default answers every prompt with an all-null mapping object, which is
/// the least-informative response a real model could legally give.
#[derive(Clone)]
pub struct MockBackend {
    response: String,
    healthy: bool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            response: r#"{"date":null,"amount":null,"currency":null,"description":null,"recipient":null}"#
                .to_string(),
            healthy: true,
        }
    }

    /// Create a mock that answers every prompt with the given text
    pub fn with_response(response: &str) -> Self {
        Self {
            response: response.to_string(),
            healthy: true,
        }
    }

    /// Create an unreachable mock backend (every generate call fails)
    pub fn unhealthy() -> Self {
        Self {
            response: String::new(),
            healthy: false,
        }
    }

    /// Create a new instance with a different model (no-op for mock)
    pub fn with_model(&self, _model: &str) -> Self {
        self.clone()
    }
}

#[async_trait]
impl AiBackend for MockBackend {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        if !self.healthy {
            return Err(Error::InvalidData("mock backend is offline".into()));
        }
        Ok(self.response.clone())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
