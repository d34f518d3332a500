use crate::{InterpretationResult, Message, Prompt, Result};
use async_trait::async_trait;
use vehicle_control::VehicleTelemetrySnapshot;

/// Anything that turns a conversation into a reply and actions.
///
/// Implementations absorb their own failures; the result is always usable.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(
        &self,
        history: &[Message],
        telemetry: &VehicleTelemetrySnapshot,
    ) -> InterpretationResult;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Remote text-generation service
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate raw text for a prompt
    async fn generate(&self, prompt: &Prompt) -> Result<String>;

    /// Model identifier for logs
    fn model_name(&self) -> &str;
}

#[async_trait]
impl Interpreter for crate::RuleBasedInterpreter {
    async fn interpret(
        &self,
        history: &[Message],
        telemetry: &VehicleTelemetrySnapshot,
    ) -> InterpretationResult {
        crate::RuleBasedInterpreter::interpret(
            self,
            crate::latest_user_utterance(history),
            telemetry,
        )
    }

    fn name(&self) -> &'static str {
        "rule-based"
    }
}
