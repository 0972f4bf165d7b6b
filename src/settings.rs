use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::services::llm::{self, ProviderKind};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub bind_addr: String,
    pub allowed_origins: Vec<String>,
    pub ai: AiSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AiSettings {
    pub provider: ProviderKind,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub fallback_models: Vec<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Answer 503 instead of falling back when no key is configured.
    pub require_api_key: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            ai: AiSettings::default(),
        }
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Groq,
            base_url: None,
            api_key: None,
            model: None,
            fallback_models: Vec::new(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            require_api_key: false,
        }
    }
}

impl AiSettings {
    /// Configured key, ignoring blanks and template placeholders.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !is_placeholder(k))
    }

    pub fn endpoint(&self) -> String {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.provider.default_endpoint())
            .to_string()
    }

    pub fn candidate_models(&self) -> Vec<String> {
        llm::candidate_models(
            self.model.as_deref(),
            &self.fallback_models,
            self.provider.default_models(),
        )
    }
}

/// Values copied from `.env.example` templates, such as `<your_key>` or
/// `your_groq_api_key`.
pub fn is_placeholder(value: &str) -> bool {
    let normalized = value.to_lowercase();
    normalized.contains('<') || normalized.contains('>') || normalized.contains("your_")
}

fn settings_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PREVENTAI_SETTINGS") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|dir| dir.join("preventai").join("settings.json"))
}

/// Load settings from the settings file (if any) and the process environment.
pub fn load() -> anyhow::Result<AppSettings> {
    load_from(settings_path().as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the JSON file at `path` when it exists, then `env`.
/// Environment values take priority.
pub fn load_from<F>(path: Option<&Path>, env: F) -> anyhow::Result<AppSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = match path {
        Some(path) if path.exists() => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings: {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse settings: {}", path.display()))?
        }
        _ => AppSettings::default(),
    };

    apply_env(&mut settings, |key| {
        env(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })?;
    Ok(settings)
}

fn apply_env<F>(settings: &mut AppSettings, env: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = env("BIND_ADDR") {
        settings.bind_addr = addr;
    } else if let Some(port) = env("PORT") {
        let port: u16 = port
            .parse()
            .with_context(|| format!("PORT must be a port number, got {:?}", port))?;
        settings.bind_addr = format!("0.0.0.0:{}", port);
    }

    if let Some(origins) = env("ALLOWED_ORIGINS") {
        settings.allowed_origins = split_list(&origins);
    }

    let ai = &mut settings.ai;
    if let Some(provider) = env("AI_PROVIDER") {
        ai.provider = match provider.parse() {
            Ok(kind) => kind,
            Err(e) => bail!("{}", e),
        };
    }
    if let Some(url) = env("AI_API_BASE_URL") {
        ai.base_url = Some(url);
    }
    if let Some(key) = env("AI_API_KEY").or_else(|| env(ai.provider.key_env_var())) {
        ai.api_key = Some(key);
    }
    if let Some(model) = env("AI_MODEL").or_else(|| env(ai.provider.model_env_var())) {
        ai.model = Some(model);
    }
    if let Some(fallbacks) = env("AI_MODEL_FALLBACKS") {
        ai.fallback_models = split_list(&fallbacks);
    }
    if let Some(secs) = env("AI_TIMEOUT_SECS") {
        ai.timeout_secs = secs
            .parse()
            .with_context(|| format!("AI_TIMEOUT_SECS must be whole seconds, got {:?}", secs))?;
    }
    if let Some(secs) = env("AI_CONNECT_TIMEOUT_SECS") {
        ai.connect_timeout_secs = secs.parse().with_context(|| {
            format!("AI_CONNECT_TIMEOUT_SECS must be whole seconds, got {:?}", secs)
        })?;
    }
    if let Some(flag) = env("AI_REQUIRE_KEY") {
        ai.require_api_key = matches!(flag.to_lowercase().as_str(), "true" | "1" | "yes" | "on");
    }
    Ok(())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = load_from(None, env_of(&[])).unwrap();
        assert_eq!(settings.bind_addr, "127.0.0.1:8000");
        assert_eq!(settings.ai.provider, ProviderKind::Groq);
        assert_eq!(settings.ai.api_key(), None);
        assert_eq!(settings.ai.candidate_models(), vec!["llama-3.1-8b-instant"]);
        assert_eq!(
            settings.ai.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_env_layering() {
        let settings = load_from(
            None,
            env_of(&[
                ("PORT", "9000"),
                ("ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
                ("AI_PROVIDER", "hf"),
                ("HF_API_KEY", "hf_secret"),
                ("AI_MODEL", "meta-llama/Llama-3.1-8B-Instruct"),
                ("AI_TIMEOUT_SECS", "12"),
                ("AI_REQUIRE_KEY", "TRUE"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.bind_addr, "0.0.0.0:9000");
        assert_eq!(
            settings.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(settings.ai.provider, ProviderKind::HuggingFace);
        assert_eq!(settings.ai.api_key(), Some("hf_secret"));
        assert_eq!(settings.ai.timeout_secs, 12);
        assert!(settings.ai.require_api_key);
        assert_eq!(
            settings.ai.candidate_models(),
            vec![
                "meta-llama/Llama-3.1-8B-Instruct",
                "Qwen/Qwen2.5-72B-Instruct",
                "mistralai/Mixtral-8x7B-Instruct-v0.1",
            ]
        );
    }

    #[test]
    fn test_generic_key_wins_over_vendor_key() {
        let settings = load_from(
            None,
            env_of(&[("AI_API_KEY", "generic"), ("GROQ_API_KEY", "vendor")]),
        )
        .unwrap();
        assert_eq!(settings.ai.api_key(), Some("generic"));
    }

    #[test]
    fn test_placeholders_are_ignored() {
        let settings = load_from(
            None,
            env_of(&[
                ("GROQ_API_KEY", "<your_groq_api_key>"),
                ("GROQ_MODEL", "your_model_here"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.ai.api_key(), None);
        assert_eq!(settings.ai.candidate_models(), vec!["llama-3.1-8b-instant"]);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(load_from(None, env_of(&[("AI_PROVIDER", "bard")])).is_err());
        assert!(load_from(None, env_of(&[("AI_TIMEOUT_SECS", "soon")])).is_err());
        assert!(load_from(None, env_of(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"bind_addr": "0.0.0.0:7000", "ai": {"provider": "gemini", "api_key": "from-file"}}"#,
        )
        .unwrap();

        let settings = load_from(Some(path.as_path()), env_of(&[("GEMINI_API_KEY", "from-env")])).unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:7000");
        assert_eq!(settings.ai.provider, ProviderKind::Gemini);
        assert_eq!(settings.ai.api_key(), Some("from-env"));
        assert_eq!(settings.ai.timeout_secs, 30);
        assert_eq!(settings.ai.candidate_models(), vec!["gemini-2.0-flash"]);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_from(Some(path.as_path()), env_of(&[])).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let settings = load_from(Some(path.as_path()), env_of(&[])).unwrap();
        assert_eq!(settings.bind_addr, AppSettings::default().bind_addr);
    }
}
