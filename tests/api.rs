use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::routing::post;
use axum::{Json, Router};
use reqwest::StatusCode;
use serde_json::{json, Value};

use preventai_lib::api::{router, AppState};
use preventai_lib::services::llm::chat::ChatCompletions;
use preventai_lib::services::llm::{BoxFuture, LlmClient, LlmError, ModelProvider, Prompt};
use preventai_lib::settings::AppSettings;

/// Replays canned replies and records which models were asked.
struct FakeProvider {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    models: Mutex<Vec<String>>,
}

impl FakeProvider {
    fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            models: Mutex::new(Vec::new()),
        })
    }
}

impl ModelProvider for FakeProvider {
    fn name(&self) -> &str {
        "Fake"
    }

    fn send<'a>(&'a self, model: &'a str, _prompt: &'a Prompt) -> BoxFuture<'a, Result<String, LlmError>> {
        Box::pin(async move {
            self.models.lock().unwrap().push(model.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Network("no reply scripted".to_string())))
        })
    }
}

fn offline_app() -> Router {
    router(AppState::with_client(AppSettings::default(), None))
}

fn app_with(provider: Arc<FakeProvider>, models: &[&str]) -> Router {
    let llm = LlmClient::new(provider, models.iter().map(|m| m.to_string()).collect());
    router(AppState::with_client(AppSettings::default(), Some(llm)))
}

/// Serve `app` on a loopback port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let url = format!("{}{}", serve(app).await, uri);
    let client = reqwest::Client::new();
    let request = match method {
        "POST" => client.post(url),
        _ => client.get(url),
    };
    let request = match body {
        Some(body) => request.json(&body),
        None => request,
    };

    let response = request.send().await.unwrap();
    let status = response.status();
    let value = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, value)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(body)).await
}

#[tokio::test]
async fn test_system_endpoints() {
    let (status, body) = send(offline_app(), "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "PreventAI API");

    let (_, body) = send(offline_app(), "GET", "/api/health", None).await;
    assert_eq!(body, json!({"healthy": true}));

    let (_, body) = send(offline_app(), "GET", "/api/test", None).await;
    assert_eq!(body["status"], "success");
    assert!(body["timestamp"].as_str().is_some());

    let (_, body) = send(offline_app(), "GET", "/api/status", None).await;
    assert_eq!(body["provider"], "groq");
    assert_eq!(body["ai_configured"], false);
    assert_eq!(body["candidate_models"], json!(["llama-3.1-8b-instant"]));
}

#[tokio::test]
async fn test_status_reports_configured_client() {
    let app = app_with(FakeProvider::new(vec![]), &["primary"]);
    let (status, body) = send(app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ai_configured"], true);
}

#[tokio::test]
async fn test_adult_analysis_without_key_uses_screening_rules() {
    let (status, body) = post_json(
        offline_app(),
        "/api/analyze/adult",
        json!({"age": 45, "weight": 85, "height": 172, "bloodPressure": 140}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["risk_score"], 63);
    assert_eq!(body["risk_level"], "High");
    assert_eq!(body["ai_model"], "rule-based-v2");
    assert_eq!(body["analysis_source"], "fallback");
    assert_eq!(
        body["risk_factors"],
        json!([
            "BMI in overweight range",
            "Systolic blood pressure is high",
            "Midlife metabolic risk considerations"
        ])
    );
}

#[tokio::test]
async fn test_pregnant_analysis_without_key_uses_screening_rules() {
    let (status, body) = post_json(
        offline_app(),
        "/api/analyze/pregnant",
        json!({"age": "34", "weight": "70", "weeks": "22"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_score"], 8);
    assert_eq!(body["risk_level"], "Low");
    assert_eq!(body["ai_model"], "rule-based-pregnancy-v1");
    assert_eq!(
        body["risk_factors"],
        json!(["No high-priority maternal risk patterns detected"])
    );
    assert_eq!(body["recommendations"], json!(["Continue routine prenatal care"]));
}

#[tokio::test]
async fn test_validation_lists_every_field() {
    let (status, body) = post_json(
        offline_app(),
        "/api/analyze/adult",
        json!({"age": -3, "weight": 0, "height": "tall"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Validation failed");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["age", "weight", "height", "bloodPressure"]);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let url = format!("{}/api/analyze/pregnant", serve(offline_app()).await);
    let response = reqwest::Client::new()
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{\"age\": 30,")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn test_adult_analysis_uses_model_answer() {
    let provider = FakeProvider::new(vec![Ok(
        "```json\n{\"risk_score\": 41, \"risk_level\": \"Moderate\", \"risk_factors\": [\"Overweight\"], \"recommendations\": [\"Walk 30 minutes daily\"]}\n```"
            .to_string(),
    )]);
    let (status, body) = post_json(
        app_with(provider, &["llama-3.1-8b-instant"]),
        "/api/analyze/adult",
        json!({"age": 45, "weight": 85, "height": 172, "bloodPressure": 140}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis_source"], "ai");
    assert_eq!(body["ai_model"], "llama-3.1-8b-instant");
    assert_eq!(body["risk_score"], 41);
    assert_eq!(body["risk_level"], "Moderate");
    assert_eq!(body["risk_factors"], json!(["Overweight"]));
}

#[tokio::test]
async fn test_unknown_model_moves_to_next_candidate() {
    let provider = FakeProvider::new(vec![
        Err(LlmError::Http {
            status: 404,
            message: "The model `old-model` does not exist".to_string(),
        }),
        Ok(r#"{"risk_score": 12, "risk_factors": [], "recommendations": []}"#.to_string()),
    ]);
    let (_, body) = post_json(
        app_with(provider.clone(), &["old-model", "new-model"]),
        "/api/analyze/pregnant",
        json!({"age": 30, "weight": 65, "weeks": 14}),
    )
    .await;

    assert_eq!(*provider.models.lock().unwrap(), vec!["old-model", "new-model"]);
    assert_eq!(body["ai_model"], "new-model");
    assert_eq!(body["risk_level"], "Low");
    assert_eq!(body["risk_factors"], json!(["No specific risks detected"]));
    assert_eq!(body["recommendations"], json!(["Maintain healthy lifestyle"]));
}

#[tokio::test]
async fn test_report_without_key_is_rule_based() {
    let (status, body) = post_json(
        offline_app(),
        "/api/report",
        json!({
            "assessmentType": "pregnant_woman",
            "age": 29,
            "height": 165,
            "weight": 60,
            "gestationalAgeWeeks": 30,
            "bloodPressureSystolic": 115,
            "bloodPressureDiastolic": 75,
            "bloodSugar": 90,
            "stressLevel": "low"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["model"], "rule-based-prevention-v1");
    assert_eq!(body["riskScore"], 21);
    assert_eq!(body["riskScoreLabel"], "21%");
    assert_eq!(body["detectedRisks"], json!(["Late-stage pregnancy monitoring needs"]));
    assert!(!body["report"].as_str().unwrap().contains("Integration Note"));
}

#[tokio::test]
async fn test_report_garbage_output_adds_integration_note() {
    let provider = FakeProvider::new(vec![Ok("Sorry, I can only chat.".to_string())]);
    let (status, body) = post_json(
        app_with(provider, &["m1"]),
        "/api/report",
        json!({"assessmentType": "general_adult", "age": 40, "height": 180, "weight": 75}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    let report = body["report"].as_str().unwrap();
    assert!(report.contains("Clinical Summary:"));
    assert!(report.contains("\n\nIntegration Note:\nThe live Fake request is currently unavailable"));
}

#[tokio::test]
async fn test_report_rejects_unknown_assessment_type() {
    let (status, body) = post_json(
        offline_app(),
        "/api/report",
        json!({"assessmentType": "child", "age": 8}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "assessmentType");
}

#[tokio::test]
async fn test_assess_is_deterministic() {
    let payload = json!({
        "assessmentType": "general_adult",
        "age": "52",
        "height": "170",
        "weight": "95",
        "bloodPressure": "150",
        "bloodSugar": 130,
        "stress": 5
    });
    let (status, first) = post_json(offline_app(), "/api/assess", payload.clone()).await;
    let (_, second) = post_json(offline_app(), "/api/assess", payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(first["riskScore"], 97);
    assert_eq!(first["riskLevel"], "High");
    assert_eq!(
        first["detectedRisks"],
        json!([
            "Elevated BMI profile",
            "High blood pressure trend",
            "High blood sugar trend",
            "High stress load"
        ])
    );
}

#[tokio::test]
async fn test_assess_accepts_device_and_merged_field_names() {
    let (status, body) = post_json(
        offline_app(),
        "/api/assess",
        json!({
            "assessmentType": "pregnant_woman",
            "gestationalAge": 30,
            "sleep": 7,
            "bloodPressure": 118,
            "bloodPressureSystolic": 118,
            "stress": 2,
            "stressLevel": "low"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["detectedRisks"],
        json!(["Late-stage pregnancy monitoring needs"])
    );
}

#[tokio::test]
async fn test_required_key_is_service_unavailable() {
    let mut settings = AppSettings::default();
    settings.ai.require_api_key = true;
    let app = router(AppState::new(settings));

    let (status, body) = post_json(
        app,
        "/api/analyze/adult",
        json!({"age": 45, "weight": 85, "height": 172, "bloodPressure": 140}),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["message"].as_str().unwrap().contains("GROQ_API_KEY"));
}

/// Stand-in for an OpenAI-compatible provider on a loopback port.
async fn spawn_provider(reply: Value, status: StatusCode) -> String {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |Json(request): Json<Value>| {
            let reply = reply.clone();
            async move {
                assert_eq!(request["messages"][0]["role"], "system");
                (status, Json(reply))
            }
        }),
    );
    format!("{}/v1/chat/completions", serve(app).await)
}

fn screening_prompt() -> Prompt {
    Prompt {
        system: Some("You are a clinical risk assistant. Output ONLY valid JSON.".to_string()),
        user: "Assess".to_string(),
        temperature: 0.2,
        max_tokens: None,
    }
}

#[tokio::test]
async fn test_chat_adapter_reads_message_content() {
    let endpoint = spawn_provider(
        json!({"choices": [{"message": {"role": "assistant", "content": "{\"risk_score\": 10}"}}]}),
        StatusCode::OK,
    )
    .await;
    let provider = ChatCompletions::new(reqwest::Client::new(), endpoint, "test-key", "Local");

    let text = provider.send("local-model", &screening_prompt()).await.unwrap();
    assert_eq!(text, "{\"risk_score\": 10}");
}

#[tokio::test]
async fn test_chat_adapter_reports_provider_error() {
    let endpoint = spawn_provider(
        json!({"error": {"message": "model not found: local-model"}}),
        StatusCode::BAD_REQUEST,
    )
    .await;
    let provider = ChatCompletions::new(reqwest::Client::new(), endpoint, "test-key", "Local");

    let err = provider.send("local-model", &screening_prompt()).await.unwrap_err();
    assert_eq!(
        err,
        LlmError::Http {
            status: 400,
            message: "model not found: local-model".to_string()
        }
    );
    assert!(err.is_retryable());
}
