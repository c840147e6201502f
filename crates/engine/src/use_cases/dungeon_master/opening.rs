//! Opening narration for a freshly started adventure.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use mythicbot_domain::{Adventure, Character, EngineSettings, ModelPreference, ModelUsed};

use super::prompts::build_opening_prompt;
use super::response_parser::strip_special_tokens;
use crate::infrastructure::model_handle::ModelHandle;
use crate::infrastructure::ports::{CredentialPort, LlmRequest};
use crate::infrastructure::telemetry::TelemetryLog;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningRequest {
    #[serde(default)]
    pub adventure: Adventure,
    #[serde(default)]
    pub character: Character,
    #[serde(default)]
    pub model: ModelPreference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningNarrative {
    pub narration: String,
    pub model_used: ModelUsed,
}

pub struct OpenAdventure {
    model: Arc<ModelHandle>,
    credentials: Arc<dyn CredentialPort>,
    telemetry: Arc<TelemetryLog>,
    settings: EngineSettings,
}

impl OpenAdventure {
    pub fn new(
        model: Arc<ModelHandle>,
        credentials: Arc<dyn CredentialPort>,
        telemetry: Arc<TelemetryLog>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            model,
            credentials,
            telemetry,
            settings,
        }
    }

    /// Ask the model for an opening; fall back to the adventure's own text, then a default.
    pub async fn execute(&self, request: OpeningRequest) -> OpeningNarrative {
        if request.model.wants_primary(self.credentials.has_credential()) {
            if let Some(narration) = self.generate(&request.adventure, &request.character).await {
                return OpeningNarrative {
                    narration,
                    model_used: ModelUsed::Primary,
                };
            }
        }

        OpeningNarrative {
            narration: offline_opening(&request.adventure, &request.character),
            model_used: ModelUsed::Fallback,
        }
    }

    async fn generate(&self, adventure: &Adventure, character: &Character) -> Option<String> {
        let client = self.credentials.get_credential().and_then(|key| {
            self.model.initialize(&key);
            self.model.current()
        })?;

        self.telemetry
            .record("ai_request_start", json!({ "flow": "opening" }));

        let request = LlmRequest::prompt(build_opening_prompt(adventure, character))
            .with_temperature(self.settings.temperature)
            .with_sampling(self.settings.top_p, self.settings.top_k)
            .with_max_tokens(Some(self.settings.max_output_tokens));

        match client.generate(request).await {
            Ok(response) => {
                let text = strip_special_tokens(&response.content).trim().to_string();
                (!text.is_empty()).then_some(text)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Opening narration failed, using built-in text");
                self.telemetry.record(
                    "ai_fallback",
                    json!({ "flow": "opening", "reason": e.kind(), "error": e.to_string() }),
                );
                None
            }
        }
    }
}

/// Built-in opening: the adventure's own narrative, else a generic one.
pub fn offline_opening(adventure: &Adventure, character: &Character) -> String {
    if let Some(text) = adventure
        .opening_narrative
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        return text.to_string();
    }

    let race = if character.race.trim().is_empty() {
        "adventurer"
    } else {
        character.race.as_str()
    };
    format!(
        "Your adventure begins, brave {race}. The world stretches before you, full of mystery and danger.\n\n\
         What path will you choose? What legends will you forge?\n\n\
         The choice is yours. What do you do?"
    )
}
