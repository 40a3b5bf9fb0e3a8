use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use releve_core::{AccountStatement, parse_statement};

use crate::config::{Provider, StructurerConfig};
use crate::error::{Result, StructuringError};
use crate::prompt;

/// Turns raw statement text into an [`AccountStatement`].
pub trait StatementStructurer {
    fn structure(&self, text: &str) -> Result<AccountStatement>;
}

/// Structurer backed by a hosted language model.
pub struct LlmStructurer {
    config: StructurerConfig,
    http: reqwest::Client,
}

impl LlmStructurer {
    pub fn new(config: StructurerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StructuringError::Network(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &StructurerConfig {
        &self.config
    }

    pub async fn structure_async(&self, text: &str) -> Result<AccountStatement> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(StructuringError::MissingApiKey(self.config.provider.api_key_var()))?;

        tracing::debug!(
            provider = %self.config.provider,
            model = %self.config.model,
            chars = text.len(),
            "requesting statement structure"
        );

        let content = match self.config.provider {
            Provider::OpenAI => self.openai_complete(key, text).await?,
            Provider::Anthropic => self.anthropic_complete(key, text).await?,
        };

        let statement = parse_content(&content)?;
        tracing::info!(
            transactions = statement.transactions.len(),
            "statement structured"
        );
        Ok(statement)
    }

    async fn openai_complete(&self, key: &str, text: &str) -> Result<String> {
        let body = openai_request(&self.config, text);
        let url = format!("{}/v1/chat/completions", self.config.endpoint_base());

        let resp = self
            .http
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "openai request failed");
                StructuringError::Network(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, "openai API error");
            return Err(StructuringError::Api {
                provider: Provider::OpenAI.to_string(),
                status: status.as_u16(),
                body: txt,
            });
        }

        let out: OpenAiResp = resp
            .json()
            .await
            .map_err(|e| StructuringError::Shape(format!("parse openai response: {e}")))?;
        openai_content(out)
    }

    async fn anthropic_complete(&self, key: &str, text: &str) -> Result<String> {
        let body = anthropic_request(&self.config, text);
        let url = format!("{}/v1/messages", self.config.endpoint_base());

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(key).map_err(|e| StructuringError::Network(e.to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "anthropic request failed");
                StructuringError::Network(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, "anthropic API error");
            return Err(StructuringError::Api {
                provider: Provider::Anthropic.to_string(),
                status: status.as_u16(),
                body: txt,
            });
        }

        let out: AnthropicResp = resp
            .json()
            .await
            .map_err(|e| StructuringError::Shape(format!("parse anthropic response: {e}")))?;
        Ok(anthropic_content(out))
    }
}

impl StatementStructurer for LlmStructurer {
    fn structure(&self, text: &str) -> Result<AccountStatement> {
        // The CLI runs under #[tokio::main]; a nested runtime's block_on would panic.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.structure_async(text)))
        } else {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| StructuringError::Runtime(e.to_string()))?;
            rt.block_on(self.structure_async(text))
        }
    }
}

/// Validate a model answer as an account statement.
pub fn parse_content(content: &str) -> Result<AccountStatement> {
    if content.trim().is_empty() {
        return Err(StructuringError::EmptyResponse);
    }
    let json = prompt::strip_code_fence(content).map_err(|e| StructuringError::Shape(e.to_string()))?;
    parse_statement(json).map_err(|e| StructuringError::Shape(e.to_string()))
}

#[derive(Debug, Serialize)]
struct Msg {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAiReq {
    model: String,
    messages: Vec<Msg>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    t: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiResp {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MsgOut,
}

#[derive(Debug, Deserialize)]
struct MsgOut {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicReq {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Msg>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResp {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    t: String,
    text: Option<String>,
}

fn openai_request(config: &StructurerConfig, text: &str) -> OpenAiReq {
    OpenAiReq {
        model: config.model.clone(),
        messages: vec![
            Msg {
                role: "system",
                content: prompt::INSTRUCTION.to_string(),
            },
            Msg {
                role: "user",
                content: prompt::user_message(text),
            },
        ],
        temperature: config.temperature,
        response_format: ResponseFormat {
            t: "json_schema",
            json_schema: JsonSchemaFormat {
                name: "account_statement",
                strict: true,
                schema: prompt::statement_schema(),
            },
        },
    }
}

fn openai_content(resp: OpenAiResp) -> Result<String> {
    let msg = resp
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or(StructuringError::EmptyResponse)?;

    match (msg.content, msg.refusal) {
        (Some(c), _) if !c.trim().is_empty() => Ok(c),
        (_, Some(r)) => Err(StructuringError::Shape(format!("model refused: {r}"))),
        _ => Err(StructuringError::EmptyResponse),
    }
}

fn anthropic_request(config: &StructurerConfig, text: &str) -> AnthropicReq {
    AnthropicReq {
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        system: prompt::system_with_schema(),
        messages: vec![Msg {
            role: "user",
            content: prompt::user_message(text),
        }],
    }
}

fn anthropic_content(resp: AnthropicResp) -> String {
    let mut s = String::new();
    for b in resp.content {
        if b.t == "text" {
            if let Some(t) = b.text {
                s.push_str(&t);
            }
        }
    }
    s
}
