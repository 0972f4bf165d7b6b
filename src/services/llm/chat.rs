use serde_json::{json, Value};

use super::{parse, BoxFuture, LlmError, ModelProvider, Prompt};

/// OpenAI-compatible `/chat/completions` endpoint (Hugging Face router, Groq,
/// xAI Grok, OpenAI).
pub struct ChatCompletions {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    label: String,
}

impl ChatCompletions {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            label: label.into(),
        }
    }

    fn body(model: &str, prompt: &Prompt) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &prompt.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": prompt.user }));

        let mut body = json!({
            "model": model,
            "messages": messages,
            "temperature": prompt.temperature,
        });
        if let Some(max_tokens) = prompt.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }

    async fn request(&self, model: &str, prompt: &Prompt) -> Result<String, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&Self::body(model, prompt))
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;
        let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(LlmError::Http {
                status: status.as_u16(),
                message: parse::describe_error(&raw),
            });
        }

        if let Some(text) = parse::chat_text(&body) {
            return Ok(text);
        }
        if let Some(message) = parse::error_message(&body) {
            return Err(LlmError::Rejected(message));
        }
        Err(LlmError::Unparseable(format!(
            "{} returned no message content",
            self.label
        )))
    }
}

impl ModelProvider for ChatCompletions {
    fn name(&self) -> &str {
        &self.label
    }

    fn send<'a>(&'a self, model: &'a str, prompt: &'a Prompt) -> BoxFuture<'a, Result<String, LlmError>> {
        Box::pin(self.request(model, prompt))
    }
}
