use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ChatError, ChatResult};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

/// The remote collaborator that turns a user message into an answer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerService: Send + Sync {
    /// Send one message. `Ok(None)` means the service replied without an answer.
    async fn ask(&self, message: &str) -> ChatResult<Option<String>>;

    /// Probe whether the service is up.
    async fn health(&self) -> ChatResult<()>;
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    endpoint: Url,
}

impl BackendClient {
    pub fn new(endpoint: &str) -> ChatResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ChatError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    fn health_url(&self) -> ChatResult<Url> {
        self.endpoint
            .join("/health")
            .map_err(|e| ChatError::InvalidEndpoint(e.to_string()))
    }
}

#[async_trait]
impl AnswerService for BackendClient {
    async fn ask(&self, message: &str) -> ChatResult<Option<String>> {
        debug!(endpoint = %self.endpoint, chars = message.chars().count(), "sending chat request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        interpret_reply(status, &body)
    }

    async fn health(&self) -> ChatResult<()> {
        let response = self.client.get(self.health_url()?).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let health: HealthResponse = serde_json::from_str(&response.text().await?)?;
        info!(status = %health.status, "backend health");
        Ok(())
    }
}

/// Map a status and body onto the answer, treating every non-2xx alike.
pub fn interpret_reply(status: StatusCode, body: &str) -> ChatResult<Option<String>> {
    if !status.is_success() {
        return Err(ChatError::Status {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    let reply: ChatResponse = serde_json::from_str(body)?;
    Ok(reply.answer)
}
