//! Intent Parser for vehicle commands
//!
//! This crate turns operator chat into structured vehicle actions. A remote
//! language model interprets the full conversation; a deterministic keyword
//! interpreter covers the same ground offline and serves as the fallback
//! whenever the remote path fails.

mod actions;
mod entities;
mod error;
mod message;
mod parser;
mod prompt;
mod remote;
mod traits;

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "mock")]
pub mod mock;

pub use actions::{
    Action, ActionType, InterpretationResult, DEFAULT_MODE, DEFAULT_TAKEOFF_ALTITUDE_M,
};
pub use entities::{Direction, QuantityExtractor, LAT_DEG_PER_METER, LON_DEG_PER_METER};
pub use error::{IntentError, Result};
pub use message::{latest_user_utterance, Message, Role};
pub use parser::RuleBasedInterpreter;
pub use prompt::{build_prompt, Prompt, SYSTEM_PROMPT};
pub use remote::{parse_response, strip_code_fence, RemoteInterpreter};
pub use traits::{Interpreter, LanguageModel};

use serde::{Deserialize, Serialize};

/// Configuration for command interpretation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    /// Takeoff altitude when the utterance names none
    pub default_altitude_m: f64,
    /// Travel distance for directional moves when the utterance names none
    pub default_distance_m: f64,
    /// Remote language model settings
    pub model: ModelConfig,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            default_altitude_m: DEFAULT_TAKEOFF_ALTITUDE_M,
            default_distance_m: 10.0,
            model: ModelConfig::default(),
        }
    }
}

/// Remote language model endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Transport timeout; `None` leaves it to the HTTP stack
    pub request_timeout_secs: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-pro".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl ModelConfig {
    /// Resolve the API key from the environment.
    ///
    /// A missing key is only warned about: the request is still sent and the
    /// resulting failure takes the fallback path like any other.
    pub fn api_key(&self) -> String {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!(
                    "{} is not set; remote interpretation will fall back to rule-based parsing",
                    self.api_key_env
                );
                String::new()
            }
        }
    }
}

/// Initialize the intent parser system
pub fn init() -> Result<()> {
    tracing::info!("Initializing Intent Parser system");
    Ok(())
}
