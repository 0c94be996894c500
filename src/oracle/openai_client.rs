// src/oracle/openai_client.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::prompts::{answer_schema, system_prompt, user_prompt};
use super::{Oracle, OraclePolicy, OracleRequest};
use crate::config::OracleConfig;
use crate::error::OracleError;
use crate::form::normalizer::AnswerNormalizer;
use crate::types::Answer;

#[derive(Debug, Deserialize)]
struct AnswerEnvelope {
    answers: Vec<Answer>,
}

/// Oracle backed by the OpenAI Responses API with a strict JSON schema.
pub struct OpenAiOracle {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    max_output_tokens: u32,
    policy: OraclePolicy,
    normalizer: AnswerNormalizer,
}

impl OpenAiOracle {
    pub fn new(config: &OracleConfig, normalizer: AnswerNormalizer) -> Result<Self, OracleError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OracleError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            api_key,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
            policy: OraclePolicy::from(config),
            normalizer,
        })
    }

    fn build_payload(&self, request: &OracleRequest) -> Result<Value, OracleError> {
        Ok(json!({
            "model": self.model,
            "input": [
                { "role": "system", "content": system_prompt() },
                { "role": "user", "content": user_prompt(request, self.policy)? },
            ],
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": "FormAnswers",
                    "strict": true,
                    "schema": answer_schema(&request.legal_ids),
                },
                "verbosity": "low",
            },
            "reasoning": { "effort": "low" },
            "max_output_tokens": self.max_output_tokens,
        }))
    }

    /// Pull answers out of a Responses API body: `output_text` first, then every
    /// `output[].content[]` text part, then the line normalizer over the first plain text.
    pub fn extract_answers(&self, body: &Value) -> Result<Vec<Answer>, OracleError> {
        let texts = response_texts(body);

        for text in &texts {
            if let Some(answers) = parse_structured(text) {
                return non_empty(answers);
            }
        }

        match texts.first() {
            Some(text) => {
                warn!("Oracle returned plain text, falling back to line normalization");
                non_empty(self.normalizer.normalize(text).into_answers())
            }
            None => Err(OracleError::Empty),
        }
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn answer(&self, request: &OracleRequest) -> Result<Vec<Answer>, OracleError> {
        let payload = self.build_payload(request)?;

        info!(
            "Requesting answers for {} field(s), {} legal id(s)",
            request.fields.len(),
            request.legal_ids.len()
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Oracle API error {}: {}", status, message);
            return Err(OracleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        let model = body.get("model").and_then(|v| v.as_str()).unwrap_or("?");
        let state = body.get("status").and_then(|v| v.as_str()).unwrap_or("?");
        debug!("Oracle response model={} status={}", model, state);

        let answers = self.extract_answers(&body)?;
        info!("Oracle returned {} answer(s)", answers.len());
        Ok(answers)
    }
}

fn response_texts(body: &Value) -> Vec<String> {
    let mut texts = Vec::new();

    if let Some(text) = body.get("output_text").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            texts.push(text.trim().to_string());
        }
    }

    let items = body.get("output").and_then(Value::as_array);
    for item in items.into_iter().flatten() {
        if item.get("type").and_then(Value::as_str) != Some("message") {
            continue;
        }
        let parts = item.get("content").and_then(Value::as_array);
        for part in parts.into_iter().flatten() {
            if part.get("type").and_then(Value::as_str) != Some("output_text") {
                continue;
            }
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    texts.push(text.trim().to_string());
                }
            }
        }
    }

    texts
}

fn parse_structured(text: &str) -> Option<Vec<Answer>> {
    if text.starts_with('{') {
        serde_json::from_str::<AnswerEnvelope>(text)
            .map(|e| e.answers)
            .ok()
    } else if text.starts_with('[') {
        serde_json::from_str::<Vec<Answer>>(text).ok()
    } else {
        None
    }
}

fn non_empty(answers: Vec<Answer>) -> Result<Vec<Answer>, OracleError> {
    if answers.is_empty() {
        Err(OracleError::Empty)
    } else {
        Ok(answers)
    }
}
