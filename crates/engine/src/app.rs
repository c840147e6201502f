//! Application state and composition.

use std::sync::Arc;
use std::time::Duration;

use mythicbot_domain::EngineSettings;

use crate::infrastructure::{
    model_handle::{LlmFactory, ModelHandle},
    ports::{ClockPort, CredentialPort, LlmPort, RandomPort},
    request_guard::{GuardedLlmClient, RateLimitConfig, RateLimiter},
    telemetry::TelemetryLog,
};
use crate::use_cases;
use crate::use_cases::dungeon_master::{
    ActionClassifier, CompanionReactionSelector, FallbackNarrator, OpenAdventure, TakeTurn,
};

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
    pub settings: EngineSettings,
    pub telemetry: Arc<TelemetryLog>,
    pub limiter: Arc<RateLimiter>,
}

/// Container for all use cases.
pub struct UseCases {
    pub dungeon_master: use_cases::DungeonMasterUseCases,
    pub settings: use_cases::SettingsUseCases,
    pub dice: use_cases::DiceUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    ///
    /// `llm_factory` builds a bare client for an API key. Every client handed
    /// out from here is wrapped in the shared rate limiter and request timeout.
    pub fn new(
        settings: EngineSettings,
        classifier: ActionClassifier,
        credentials: Arc<dyn CredentialPort>,
        llm_factory: LlmFactory,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        let telemetry = Arc::new(TelemetryLog::new(settings.features.telemetry, clock.clone()));
        let limiter = Arc::new(RateLimiter::new(
            RateLimitConfig::from_settings(&settings),
            clock.clone(),
        ));
        let guarded = guarded_factory(
            llm_factory,
            limiter.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        );
        let model = Arc::new(ModelHandle::new(guarded.clone()));

        let reactions = Arc::new(CompanionReactionSelector::new(
            random.clone(),
            settings.trivial_speak_percent,
            settings.eventful_speak_percent,
        ));
        let fallback = Arc::new(FallbackNarrator::new(random.clone(), reactions.clone()));

        let take_turn = Arc::new(TakeTurn::new(
            Arc::new(classifier),
            model.clone(),
            credentials.clone(),
            fallback,
            reactions,
            telemetry.clone(),
            clock.clone(),
            settings.clone(),
        ));
        let open_adventure = Arc::new(OpenAdventure::new(
            model.clone(),
            credentials.clone(),
            telemetry.clone(),
            settings.clone(),
        ));

        let manage_credential = Arc::new(use_cases::settings::ManageCredential::new(
            credentials.clone(),
            model,
            guarded,
            telemetry.clone(),
        ));
        let list_models = Arc::new(use_cases::settings::ListModels::new(credentials));

        let roll_die = Arc::new(use_cases::dice::RollDie::new(random, clock));

        let use_cases = UseCases {
            dungeon_master: use_cases::DungeonMasterUseCases::new(take_turn, open_adventure),
            settings: use_cases::SettingsUseCases::new(manage_credential, list_models),
            dice: use_cases::DiceUseCases::new(roll_die),
        };

        Self {
            use_cases,
            settings,
            telemetry,
            limiter,
        }
    }
}

/// Wrap every client a factory builds in the shared limiter and timeout.
fn guarded_factory(inner: LlmFactory, limiter: Arc<RateLimiter>, timeout: Duration) -> LlmFactory {
    Arc::new(move |key: &str| {
        Arc::new(GuardedLlmClient::new(inner(key), limiter.clone(), timeout)) as Arc<dyn LlmPort>
    })
}
