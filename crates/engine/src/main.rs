//! MythicBot Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mythicbot_domain::EngineSettings;
use mythicbot_engine::{
    api,
    infrastructure::{
        clock::{SystemClock, SystemRandom},
        credentials::InMemoryCredentialStore,
        gemini::GeminiClient,
        model_handle::LlmFactory,
        ports::LlmPort,
    },
    use_cases::dungeon_master::{ActionClassifier, RuleTable},
    App,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be started from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mythicbot_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting MythicBot Engine");

    // Load configuration
    let settings = EngineSettings::from_env();
    let server_host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let server_port: u16 = std::env::var("SERVER_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .unwrap_or(3000);

    tracing::info!(
        model = %settings.model_name,
        rate_window_secs = settings.rate_window_secs,
        rate_max_requests = settings.rate_max_requests,
        request_timeout_secs = settings.request_timeout_secs,
        structured_output = settings.features.structured_ai_output,
        "Engine settings loaded"
    );

    let classifier = ActionClassifier::new(load_rule_table())?;

    let credentials = Arc::new(InMemoryCredentialStore::from_env());

    let base_url = settings.api_base_url.clone();
    let model_name = settings.model_name.clone();
    let llm_factory: LlmFactory = Arc::new(move |api_key: &str| {
        Arc::new(GeminiClient::new(&base_url, &model_name, api_key)) as Arc<dyn LlmPort>
    });

    // Create application
    let app = Arc::new(App::new(
        settings,
        classifier,
        credentials,
        llm_factory,
        Arc::new(SystemClock),
        Arc::new(SystemRandom),
    ));

    let mut router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer_from_env() {
        router = router.layer(cors);
    }

    // Start server
    let addr: SocketAddr = format!("{server_host}:{server_port}").parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

/// Keyword table from `MYTHICBOT_RULES_PATH`, or the built-in one.
fn load_rule_table() -> RuleTable {
    let Ok(path) = std::env::var("MYTHICBOT_RULES_PATH") else {
        return RuleTable::builtin();
    };

    match RuleTable::from_json_file(&path) {
        Ok(table) => {
            tracing::info!(path = %path, rules = table.rules.len(), "Loaded keyword rules");
            table
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path, "Failed to load keyword rules, using built-in table");
            RuleTable::builtin()
        }
    }
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer_from_env() -> Option<CorsLayer> {
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())?;

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
