use serde_json::{json, Value};

use super::{parse, BoxFuture, LlmError, ModelProvider, Prompt};

/// Google Gemini `generateContent` adapter.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn body(prompt: &Prompt) -> Value {
        let mut generation_config = json!({ "temperature": prompt.temperature });
        if let Some(max_tokens) = prompt.max_tokens {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }

        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt.user }]
            }],
            "generationConfig": generation_config,
        });
        if let Some(system) = &prompt.system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        body
    }

    async fn request(&self, model: &str, prompt: &Prompt) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.url(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::body(prompt))
            .send()
            .await
            .map_err(|e| LlmError::Network(format!("Gemini API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http {
                status: status.as_u16(),
                message: parse::describe_error(&error_body),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Unparseable(format!("Failed to parse Gemini response: {}", e)))?;

        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        match text {
            Some(text) => Ok(parse::strip_code_fences(text).to_string()),
            None => match parse::error_message(&body) {
                Some(message) => Err(LlmError::Rejected(message)),
                None => Err(LlmError::Unparseable("No text in Gemini response".to_string())),
            },
        }
    }
}

impl ModelProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn send<'a>(&'a self, model: &'a str, prompt: &'a Prompt) -> BoxFuture<'a, Result<String, LlmError>> {
        Box::pin(self.request(model, prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_and_body() {
        let provider = GeminiProvider::new(
            reqwest::Client::new(),
            "https://generativelanguage.googleapis.com/v1beta/",
            "key",
        );
        assert_eq!(
            provider.url("gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );

        let prompt = Prompt {
            system: Some("system".to_string()),
            user: "user".to_string(),
            temperature: 0.3,
            max_tokens: Some(850),
        };
        let body = GeminiProvider::body(&prompt);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "user");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 850);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "system");
    }
}
