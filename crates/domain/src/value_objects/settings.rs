//! Engine settings value object
//!
//! Settings are plain serde data so they can be returned over the API and
//! overridden from the environment (`MYTHICBOT_*` variables).

use serde::{Deserialize, Serialize};

/// All configurable engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSettings {
    // ============================================================================
    // Rate Limiting & Timeouts
    // ============================================================================
    /// Length of the sliding rate-limit window in seconds
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,

    /// Maximum model requests allowed inside one window
    #[serde(default = "default_rate_max_requests")]
    pub rate_max_requests: usize,

    /// Hard timeout for a single model request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // ============================================================================
    // Prompt Context
    // ============================================================================
    /// Number of recent history entries included in prompts
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    // ============================================================================
    // Companion Chatter
    // ============================================================================
    /// Chance (percent) that a companion speaks after a trivial action
    #[serde(default = "default_trivial_speak_percent")]
    pub trivial_speak_percent: u32,

    /// Chance (percent) that a companion speaks after a success or failure
    #[serde(default = "default_eventful_speak_percent")]
    pub eventful_speak_percent: u32,

    // ============================================================================
    // Model Generation
    // ============================================================================
    #[serde(default = "default_model_name")]
    pub model_name: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default)]
    pub features: FeatureFlags,
}

fn default_rate_window_secs() -> u64 { 10 }
fn default_rate_max_requests() -> usize { 6 }
fn default_request_timeout_secs() -> u64 { 30 }
fn default_history_window() -> usize { 6 }
fn default_trivial_speak_percent() -> u32 { 30 }
fn default_eventful_speak_percent() -> u32 { 60 }
fn default_model_name() -> String { "gemini-2.0-flash".to_string() }
fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_temperature() -> f32 { 0.9 }
fn default_top_p() -> f32 { 0.95 }
fn default_top_k() -> u32 { 40 }
fn default_max_output_tokens() -> u32 { 1024 }

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            rate_window_secs: default_rate_window_secs(),
            rate_max_requests: default_rate_max_requests(),
            request_timeout_secs: default_request_timeout_secs(),
            history_window: default_history_window(),
            trivial_speak_percent: default_trivial_speak_percent(),
            eventful_speak_percent: default_eventful_speak_percent(),
            model_name: default_model_name(),
            api_base_url: default_api_base_url(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            features: FeatureFlags::default(),
        }
    }
}

impl EngineSettings {
    /// Load settings from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            rate_window_secs: env_or("MYTHICBOT_RATE_WINDOW_SECS", defaults.rate_window_secs),
            rate_max_requests: env_or("MYTHICBOT_RATE_MAX_REQUESTS", defaults.rate_max_requests),
            request_timeout_secs: env_or("MYTHICBOT_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            history_window: env_or("MYTHICBOT_HISTORY_WINDOW", defaults.history_window),
            trivial_speak_percent: env_or("MYTHICBOT_TRIVIAL_SPEAK_PERCENT", defaults.trivial_speak_percent),
            eventful_speak_percent: env_or("MYTHICBOT_EVENTFUL_SPEAK_PERCENT", defaults.eventful_speak_percent),
            model_name: env_or("MYTHICBOT_MODEL", defaults.model_name),
            api_base_url: env_or("MYTHICBOT_API_BASE_URL", defaults.api_base_url),
            temperature: env_or("MYTHICBOT_TEMPERATURE", defaults.temperature),
            top_p: env_or("MYTHICBOT_TOP_P", defaults.top_p),
            top_k: env_or("MYTHICBOT_TOP_K", defaults.top_k),
            max_output_tokens: env_or("MYTHICBOT_MAX_OUTPUT_TOKENS", defaults.max_output_tokens),
            features: FeatureFlags::from_env(),
        }
    }
}

/// Feature toggles; every flag defaults to enabled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Ask the model for JSON output instead of prose with inline companion lines
    #[serde(default = "enabled")]
    pub structured_ai_output: bool,
    /// Gate model requests through the sliding-window rate limiter
    #[serde(default = "enabled")]
    pub ai_rate_limiting: bool,
    /// Record telemetry events
    #[serde(default = "enabled")]
    pub telemetry: bool,
}

fn enabled() -> bool { true }

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            structured_ai_output: true,
            ai_rate_limiting: true,
            telemetry: true,
        }
    }
}

impl FeatureFlags {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            structured_ai_output: flag_or("MYTHICBOT_FF_STRUCTURED_AI_OUTPUT", defaults.structured_ai_output),
            ai_rate_limiting: flag_or("MYTHICBOT_FF_AI_RATE_LIMITING", defaults.ai_rate_limiting),
            telemetry: flag_or("MYTHICBOT_FF_TELEMETRY", defaults.telemetry),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Only the literal `true` (any case) enables a flag that is set.
fn flag_or(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.rate_window_secs, 10);
        assert_eq!(settings.rate_max_requests, 6);
        assert_eq!(settings.history_window, 6);
        assert_eq!(settings.max_output_tokens, 1024);
        assert!(settings.features.structured_ai_output);
        assert!(settings.features.ai_rate_limiting);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"rate_max_requests": 2}"#).expect("deserialize");
        assert_eq!(settings.rate_max_requests, 2);
        assert_eq!(settings.rate_window_secs, 10);
        assert_eq!(settings.model_name, "gemini-2.0-flash");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("1"));
        assert!(!parse_flag("false"));
    }
}
