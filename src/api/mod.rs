// HTTP surface: axum handlers over the services layer

pub mod analyze;
pub mod error;
pub mod report;
pub mod system;

use std::sync::Arc;
use std::time::Instant;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::services::llm::LlmClient;
use crate::settings::AppSettings;
use error::ApiError;

pub struct AppState {
    pub settings: Arc<AppSettings>,
    pub llm: Option<LlmClient>,
    /// Why `llm` is absent, with a remediation hint.
    pub llm_error: Option<String>,
    pub started_at: Instant,
}

impl AppState {
    /// Build the model client from settings. A missing key is not fatal; the
    /// service falls back to the rule engines unless the key is required.
    pub fn new(settings: AppSettings) -> Self {
        match LlmClient::from_settings(&settings.ai) {
            Ok(client) => {
                log::info!(
                    "AI provider {} configured with models [{}]",
                    settings.ai.provider.as_str(),
                    client.candidates().join(", ")
                );
                Self::with_client(settings, Some(client))
            }
            Err(e) => {
                log::warn!("AI disabled, using rule-based analysis: {}", e);
                let mut state = Self::with_client(settings, None);
                state.llm_error = Some(e.to_string());
                state
            }
        }
    }

    pub fn with_client(settings: AppSettings, llm: Option<LlmClient>) -> Self {
        Self {
            settings: Arc::new(settings),
            llm,
            llm_error: None,
            started_at: Instant::now(),
        }
    }

    /// The model client, or `Unavailable` when AI is required but not configured.
    pub fn model_client(&self) -> Result<Option<&LlmClient>, ApiError> {
        match &self.llm {
            Some(llm) => Ok(Some(llm)),
            None if self.settings.ai.require_api_key => Err(ApiError::Unavailable(
                self.llm_error
                    .clone()
                    .unwrap_or_else(|| "AI provider is not configured.".to_string()),
            )),
            None => Ok(None),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.settings.allowed_origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(system::root))
        .route("/api/test", get(system::test))
        .route("/api/health", get(system::health))
        .route("/api/status", get(system::status))
        .route("/api/analyze/adult", post(analyze::adult))
        .route("/api/analyze/pregnant", post(analyze::pregnant))
        .route("/api/assess", post(report::assess))
        .route("/api/report", post(report::report))
        .layer(cors)
        .with_state(Arc::new(state))
}

fn allowed_origins(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|o| o == "*") {
        return AllowOrigin::any();
    }
    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    AllowOrigin::list(values)
}
