use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::directive::{DirectiveExtractor, ExtractorConfig};
use crate::errors::{PantryError, PantryResult};
use crate::types::{ChatRequest, ChatResponseBody, NormalizedReply};

/// Message shown in place of a reply when the assistant service fails
pub const FALLBACK_MESSAGE: &str =
    "Sorry, I encountered an error connecting to the AI agent. Please ensure the backend is running!";

/// Settings for [`AssistantClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the assistant service, without the `/chat` path
    pub endpoint: String,
    pub timeout: Option<Duration>,
    pub extractor: ExtractorConfig,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: None,
            extractor: ExtractorConfig::default(),
        }
    }
}

/// Appends the dietary preference suffix transmitted with a message.
///
/// The untouched `text` is what the conversation history displays.
pub fn annotate_message<S: AsRef<str>>(text: &str, tags: &[S]) -> String {
    if tags.is_empty() {
        return text.to_string();
    }

    let joined = tags.iter().map(|t| t.as_ref()).collect::<Vec<_>>().join(", ");
    format!("{} (Dietary preferences: {})", text, joined)
}

/// Client for the remote grocery assistant service
#[derive(Debug, Clone)]
pub struct AssistantClient {
    client: Client,
    endpoint: String,
    extractor: DirectiveExtractor,
}

impl AssistantClient {
    /// Create a new assistant client
    pub fn new(config: ClientConfig) -> PantryResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PantryError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            extractor: DirectiveExtractor::new(config.extractor),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    /// Sends one message and normalizes the reply.
    ///
    /// Preference tags are appended to the transmitted text only. There is no
    /// retry; any failure is returned to the caller.
    #[instrument(skip(self, user_text, tags), fields(endpoint = %self.endpoint))]
    pub async fn send<S: AsRef<str>>(
        &self,
        user_text: &str,
        tags: &[S],
    ) -> PantryResult<NormalizedReply> {
        let request = ChatRequest {
            message: annotate_message(user_text, tags),
        };
        debug!(message = %request.message, "sending chat message");

        let response = self
            .client
            .post(self.url("chat"))
            .json(&request)
            .send()
            .await
            .map_err(|e| PantryError::Request(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                PantryError::Response(format!("Failed to read error response: {}", e))
            })?;

            return Err(PantryError::Http {
                status_code: status.as_u16(),
                message: format!("Assistant request failed: {}", error_body),
            });
        }

        let body = response
            .json::<ChatResponseBody>()
            .await
            .map_err(|e| PantryError::Parsing(format!("Failed to parse response: {}", e)))?;

        Ok(self.normalize(body))
    }

    /// Like [`send`](Self::send), but a failure becomes the fallback reply.
    ///
    /// The error, if any, is returned alongside so the caller can log it.
    pub async fn send_or_fallback<S: AsRef<str>>(
        &self,
        user_text: &str,
        tags: &[S],
        fallback: &str,
    ) -> (NormalizedReply, Option<PantryError>) {
        match self.send(user_text, tags).await {
            Ok(reply) => (reply, None),
            Err(e) => {
                warn!(error = %e, "assistant request failed, using fallback reply");
                (NormalizedReply::fallback(fallback), Some(e))
            }
        }
    }

    /// Turns a response body into a display-ready reply. Directive extraction
    /// happens here and nowhere else on the receive path.
    pub fn normalize(&self, body: ChatResponseBody) -> NormalizedReply {
        let segments = self.extractor.extract(&body.response);
        debug!(
            segments = segments.len(),
            recipes = body.recipes.len(),
            "normalized assistant reply"
        );

        NormalizedReply {
            text: body.response,
            segments,
            recipes: body.recipes,
            missing_ingredients: body.missing_ingredients,
        }
    }

    /// Checks the service's health endpoint
    pub async fn health(&self) -> PantryResult<bool> {
        let response = self
            .client
            .get(self.url("health"))
            .send()
            .await
            .map_err(|e| PantryError::Request(format!("Failed to reach assistant: {}", e)))?;

        Ok(response.status().is_success())
    }
}
