//! HTTP routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use mythicbot_domain::{
    validate_roster, Character, DieRoll, DomainError, EngineSettings, ModelPreference,
    PendingRoll, RollOutcome, SessionSnapshot, TurnResult,
};

use crate::app::App;
use crate::infrastructure::telemetry::TelemetryEvent;
use crate::use_cases::dice::DiceError;
use crate::use_cases::dungeon_master::{OpeningNarrative, OpeningRequest, TurnRequest};
use crate::use_cases::settings::{CredentialError, CredentialStatus, ModelInfo};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/turn", post(take_turn))
        .route("/api/session/turn", post(session_turn))
        .route("/api/opening", post(open_adventure))
        .route("/api/models", get(list_models))
        .route(
            "/api/credential",
            get(credential_status).put(set_credential).delete(clear_credential),
        )
        .route("/api/roll", post(roll_die))
        .route("/api/roll/check", post(roll_check))
        .route("/api/settings", get(get_settings))
        .route("/api/telemetry", get(telemetry))
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    credential_configured: bool,
    requests_in_window: usize,
    rate_limit: usize,
}

async fn status(State(app): State<Arc<App>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        credential_configured: app.use_cases.settings.credential.status().configured,
        requests_in_window: app.limiter.in_window(),
        rate_limit: app.settings.rate_max_requests,
    })
}

// =============================================================================
// Dungeon Master
// =============================================================================

async fn take_turn(
    State(app): State<Arc<App>>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnResult>, ApiError> {
    validate_roster(&request.companions)?;
    let result = app.use_cases.dungeon_master.take_turn.execute(request).await;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionTurnRequest {
    session: SessionSnapshot,
    #[serde(default)]
    action: String,
    #[serde(default)]
    roll_result: Option<RollOutcome>,
    #[serde(default)]
    model: ModelPreference,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionTurnResponse {
    result: TurnResult,
    session: SessionSnapshot,
}

/// Play a turn against a client-persisted snapshot and hand back the updated one.
async fn session_turn(
    State(app): State<Arc<App>>,
    Json(request): Json<SessionTurnRequest>,
) -> Result<Json<SessionTurnResponse>, ApiError> {
    let mut session = request.session.into_state()?;
    validate_roster(&session.companions)?;
    let result = app
        .use_cases
        .dungeon_master
        .take_turn
        .play(&mut session, &request.action, request.roll_result, request.model)
        .await;
    Ok(Json(SessionTurnResponse {
        result,
        session: SessionSnapshot::new(session),
    }))
}

async fn open_adventure(
    State(app): State<Arc<App>>,
    Json(request): Json<OpeningRequest>,
) -> Json<OpeningNarrative> {
    Json(app.use_cases.dungeon_master.open_adventure.execute(request).await)
}

// =============================================================================
// Settings
// =============================================================================

async fn list_models(State(app): State<Arc<App>>) -> Json<Vec<ModelInfo>> {
    Json(app.use_cases.settings.models.execute())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetCredentialRequest {
    api_key: String,
}

async fn credential_status(State(app): State<Arc<App>>) -> Json<CredentialStatus> {
    Json(app.use_cases.settings.credential.status())
}

async fn set_credential(
    State(app): State<Arc<App>>,
    Json(request): Json<SetCredentialRequest>,
) -> Result<Json<CredentialStatus>, ApiError> {
    let status = app
        .use_cases
        .settings
        .credential
        .set(&request.api_key)
        .await?;
    Ok(Json(status))
}

async fn clear_credential(State(app): State<Arc<App>>) -> Json<CredentialStatus> {
    Json(app.use_cases.settings.credential.clear())
}

async fn get_settings(State(app): State<Arc<App>>) -> Json<EngineSettings> {
    Json(app.settings.clone())
}

async fn telemetry(State(app): State<Arc<App>>) -> Json<Vec<TelemetryEvent>> {
    Json(app.telemetry.events())
}

// =============================================================================
// Dice
// =============================================================================

#[derive(Debug, Deserialize)]
struct RollDieRequest {
    #[serde(default = "default_sides")]
    sides: u32,
}

fn default_sides() -> u32 {
    mythicbot_domain::D20
}

#[derive(Debug, Serialize)]
struct RollDieResponse {
    #[serde(flatten)]
    roll: DieRoll,
    message: String,
}

async fn roll_die(
    State(app): State<Arc<App>>,
    Json(request): Json<RollDieRequest>,
) -> Result<Json<RollDieResponse>, ApiError> {
    let roll = app.use_cases.dice.roll_die.execute(request.sides)?;
    Ok(Json(RollDieResponse {
        message: roll.message(),
        roll,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RollCheckRequest {
    pending_roll: PendingRoll,
    #[serde(default)]
    character: Character,
}

async fn roll_check(
    State(app): State<Arc<App>>,
    Json(request): Json<RollCheckRequest>,
) -> Json<RollOutcome> {
    Json(
        app.use_cases
            .dice
            .roll_die
            .roll_check(&request.pending_roll, &request.character),
    )
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<CredentialError> for ApiError {
    fn from(e: CredentialError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<DiceError> for ApiError {
    fn from(e: DiceError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom};
    use crate::infrastructure::credentials::InMemoryCredentialStore;
    use crate::infrastructure::model_handle::LlmFactory;
    use crate::infrastructure::ports::{LlmPort, MockLlmPort};
    use crate::use_cases::dungeon_master::ActionClassifier;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use tower::ServiceExt;

    fn router() -> Router {
        let factory: LlmFactory = Arc::new(|_key: &str| {
            let mut llm = MockLlmPort::new();
            llm.expect_generate().never();
            Arc::new(llm) as Arc<dyn LlmPort>
        });
        let app = App::new(
            EngineSettings::default(),
            ActionClassifier::default(),
            Arc::new(InMemoryCredentialStore::default()),
            factory,
            Arc::new(FixedClock(Utc::now())),
            Arc::new(FixedRandom(99)),
        );
        routes().with_state(Arc::new(app))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8_lossy(&bytes).to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/api/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_turn_requests_roll_offline() {
        let response = router()
            .oneshot(json_request(
                "POST",
                "/api/turn",
                serde_json::json!({ "action": "I attack the goblin" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["waitingForRoll"], true);
        assert_eq!(body["modelUsed"], "fallback");
        assert_eq!(body["rollParams"]["dc"], 13);
        assert_eq!(body["rollParams"]["characterName"], "player");
        assert_eq!(body["rollType"], "attack_roll");
    }

    #[tokio::test]
    async fn test_turn_rejects_oversized_party() {
        let companion = |name: &str| serde_json::json!({ "name": name, "personality": "Wise" });
        let response = router()
            .oneshot(json_request(
                "POST",
                "/api/turn",
                serde_json::json!({
                    "action": "look around",
                    "companions": [companion("A"), companion("B"), companion("C"), companion("D")]
                }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_session_turn_round_trips_pending_roll() {
        let app = router();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/session/turn",
                serde_json::json!({
                    "session": { "schemaVersion": 1, "state": {} },
                    "action": "I attack the goblin"
                }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["result"]["waitingForRoll"], true);
        assert_eq!(body["session"]["state"]["pendingRoll"]["dc"], 13);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/session/turn",
                serde_json::json!({
                    "session": body["session"],
                    "rollResult": { "raw": 18, "modifier": 0, "total": 18, "isSuccess": true }
                }),
            ))
            .await
            .expect("response");
        let body = body_json(response).await;
        assert_eq!(body["result"]["roll"], 18);
        assert_eq!(body["result"]["isSuccess"], true);
        assert!(body["session"]["state"]["pendingRoll"].is_null());
    }

    #[tokio::test]
    async fn test_session_turn_rejects_unknown_schema() {
        let response = router()
            .oneshot(json_request(
                "POST",
                "/api/session/turn",
                serde_json::json!({
                    "session": { "schemaVersion": 99, "state": {} },
                    "action": "look around"
                }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_models_without_credential() {
        let response = router()
            .oneshot(Request::get("/api/models").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let body = body_json(response).await;
        assert_eq!(body[0]["id"], "offline");
        assert_eq!(body[0]["available"], true);
        assert_eq!(body[1]["available"], false);
    }

    #[tokio::test]
    async fn test_bad_key_format_is_user_actionable() {
        let response = router()
            .oneshot(json_request(
                "PUT",
                "/api/credential",
                serde_json::json!({ "apiKey": "sk-not-gemini" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("AIza"));
    }

    #[tokio::test]
    async fn test_roll_die() {
        let app = router();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/roll", serde_json::json!({ "sides": 20 })))
            .await
            .expect("response");
        let body = body_json(response).await;
        assert_eq!(body["value"], 20);
        assert_eq!(body["isCritical"], true);
        assert_eq!(body["message"], "🎲 I roll a d20... [20] Critical!");

        let response = app
            .oneshot(json_request("POST", "/api/roll", serde_json::json!({ "sides": 7 })))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_opening_offline_uses_adventure_text() {
        let response = router()
            .oneshot(json_request(
                "POST",
                "/api/opening",
                serde_json::json!({
                    "adventure": { "name": "Crypt", "openingNarrative": "Fog clings to the reeds." },
                    "model": "offline"
                }),
            ))
            .await
            .expect("response");
        let body = body_json(response).await;
        assert_eq!(body["narration"], "Fog clings to the reeds.");
        assert_eq!(body["modelUsed"], "fallback");
    }

    #[tokio::test]
    async fn test_telemetry_starts_empty() {
        let response = router()
            .oneshot(Request::get("/api/telemetry").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }
}
