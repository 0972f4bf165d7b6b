use serde_json::{Map, Value};

/// Remove a surrounding markdown code fence (```json ... ``` or ``` ... ```).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```JSON"))
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Parse a JSON object out of model text. Tries the (fence-stripped) text as a
/// whole first, then the span from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let cleaned = strip_code_fences(text);
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(cleaned) {
        return Some(map);
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&cleaned[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Pull the generated text out of the response shapes providers are known to
/// return. Returns `None` when no non-empty text is present.
pub fn chat_text(body: &Value) -> Option<String> {
    let choice = &body["choices"][0];
    let content = &choice["message"]["content"];

    let text = match content {
        Value::String(s) => Some(s.clone()),
        Value::Array(blocks) => Some(joined_text(blocks.iter())),
        _ => None,
    }
    .filter(|s| !s.trim().is_empty())
    .or_else(|| choice["text"].as_str().map(str::to_string))
    .or_else(|| body["output_text"].as_str().map(str::to_string))
    .or_else(|| {
        body["output"].as_array().map(|items| {
            joined_text(
                items
                    .iter()
                    .filter_map(|item| item["content"].as_array())
                    .flatten(),
            )
        })
    })
    .or_else(|| body["candidates"][0]["content"]["parts"][0]["text"].as_str().map(str::to_string))
    .or_else(|| body["generated_text"].as_str().map(str::to_string))
    .or_else(|| body[0]["generated_text"].as_str().map(str::to_string))?;

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn joined_text<'a>(blocks: impl Iterator<Item = &'a Value>) -> String {
    blocks
        .filter_map(|block| match block {
            Value::String(s) => Some(s.as_str()),
            other => other["text"].as_str(),
        })
        .collect::<Vec<_>>()
        .join("")
}

/// Error text carried by a provider payload: a bare string, `error` as a string,
/// `error.message`, `[0].error`, then a top-level `message`.
pub fn error_message(body: &Value) -> Option<String> {
    let message = match body {
        Value::String(s) => Some(s.as_str()),
        _ => body["error"]
            .as_str()
            .or_else(|| body["error"]["message"].as_str())
            .or_else(|| body[0]["error"].as_str())
            .or_else(|| body["message"].as_str()),
    }?;

    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

/// Human-readable reason for a failed HTTP exchange. JSON bodies without a
/// recognised error field are echoed as JSON; other bodies are used verbatim.
pub fn describe_error(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "Unknown API error".to_string();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(body) => error_message(&body).unwrap_or_else(|| body.to_string()),
        Err(_) => raw.to_string(),
    }
}

/// Non-empty strings from a JSON array; anything else yields an empty list.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Score from a number or a string such as `"72%"`, rounded and clamped to
/// 0..=100.
pub fn parse_score(value: Option<&Value>) -> Option<u8> {
    let raw = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

/// First present key among `keys`.
pub fn field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k).filter(|v| !v.is_null()))
}
