use async_trait::async_trait;
use reqwest::{Client, header::AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::services::LanguageModelService;

const TEMPERATURE: f64 = 0.3;

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Returns `None` when no API key is configured.
    pub fn from_config(config: &AppConfig) -> AppResult<Option<Self>> {
        let Some(api_key) = config.openai_api_key.clone() else {
            return Ok(None);
        };
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|err| AppError::GenerationApi(format!("failed to build client: {err}")))?;

        Ok(Some(Self {
            http,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.openai_model.clone(),
        }))
    }

    fn completions_endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LanguageModelService for OpenAiClient {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
        };
        debug!(model = %self.model, "requesting reply draft");

        let response = self
            .http
            .post(self.completions_endpoint())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|err| AppError::GenerationApi(format!("failed to call OpenAI: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::GenerationApi(format!(
                "OpenAI responded with {status}: {body}"
            )));
        }

        let payload: ChatCompletionResponse =
            response.json().await.map_err(|err| AppError::Decode {
                service: "OpenAI",
                detail: err.to_string(),
            })?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| AppError::Decode {
                service: "OpenAI",
                detail: "response contained no message content".to_string(),
            })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
