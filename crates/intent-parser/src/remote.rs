//! Language-model backed interpreter with rule-based fallback

use crate::{
    build_prompt, latest_user_utterance, IntentError, InterpretationResult, Interpreter,
    LanguageModel, Message, Result, RuleBasedInterpreter,
};
use async_trait::async_trait;
use std::sync::Arc;
use vehicle_control::VehicleTelemetrySnapshot;

/// Interprets the whole conversation with a remote model.
///
/// Transport errors, missing candidates and malformed output all take the
/// same path: the latest user utterance goes to the rule-based interpreter.
pub struct RemoteInterpreter {
    model: Arc<dyn LanguageModel>,
    fallback: RuleBasedInterpreter,
}

impl RemoteInterpreter {
    pub fn new(model: Arc<dyn LanguageModel>, fallback: RuleBasedInterpreter) -> Self {
        Self { model, fallback }
    }

    pub async fn interpret(
        &self,
        history: &[Message],
        telemetry: &VehicleTelemetrySnapshot,
    ) -> InterpretationResult {
        match self.try_remote(history, telemetry).await {
            Ok(result) => {
                tracing::info!(
                    "{} returned {} action(s)",
                    self.model.model_name(),
                    result.actions.len()
                );
                result
            }
            Err(e) => {
                tracing::warn!("remote interpretation failed, using rule-based fallback: {}", e);
                self.fallback
                    .interpret(latest_user_utterance(history), telemetry)
            }
        }
    }

    async fn try_remote(
        &self,
        history: &[Message],
        telemetry: &VehicleTelemetrySnapshot,
    ) -> Result<InterpretationResult> {
        let prompt = build_prompt(history, telemetry)?;
        let raw = self.model.generate(&prompt).await?;
        tracing::debug!("model output: {}", raw);
        parse_response(&raw)
    }
}

#[async_trait]
impl Interpreter for RemoteInterpreter {
    async fn interpret(
        &self,
        history: &[Message],
        telemetry: &VehicleTelemetrySnapshot,
    ) -> InterpretationResult {
        RemoteInterpreter::interpret(self, history, telemetry).await
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Strip a surrounding markdown code fence, with or without a language tag.
///
/// Text that does not open with a fence is returned trimmed. An unterminated
/// fence runs to the end of the text.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // language tag, if any, runs up to the first whitespace or opening brace
    let body_start = rest
        .find(|c: char| c.is_whitespace() || c == '{' || c == '[')
        .unwrap_or(rest.len());
    let rest = &rest[body_start..];
    let body = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    body.trim()
}

/// Parse raw model output strictly as an [`InterpretationResult`].
pub fn parse_response(raw: &str) -> Result<InterpretationResult> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(IntentError::InvalidResponse("empty model output".to_string()));
    }
    Ok(serde_json::from_str(body)?)
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::mock::ScriptedModel;
    use crate::{Action, IntentConfig};

    fn telemetry() -> VehicleTelemetrySnapshot {
        VehicleTelemetrySnapshot {
            latitude: 10.0,
            longitude: 20.0,
            altitude: 5.0,
            battery_voltage: 11.1,
            battery_percent: 80.0,
            ..Default::default()
        }
    }

    fn fallback() -> RuleBasedInterpreter {
        RuleBasedInterpreter::new(IntentConfig::default()).unwrap()
    }

    fn history(latest: &str) -> Vec<Message> {
        vec![
            Message::assistant("Hello!"),
            Message::user("take off to 30 meters"),
            Message::assistant("Taking off to 30 meters altitude."),
            Message::user(latest),
        ]
    }

    const TAKEOFF_JSON: &str = r#"{
  "text": "Taking off to 10 meters altitude.",
  "actions": [
    { "type": "setMode", "params": { "mode": "GUIDED" } },
    { "type": "arm" },
    { "type": "takeoff", "params": { "altitude": 10 } }
  ]
}"#;

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```JSON {\"a\":1} ```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_fenced_and_bare_parse_identically() {
        let fenced = format!("```json\n{}\n```", TAKEOFF_JSON);
        let bare = parse_response(TAKEOFF_JSON).unwrap();
        assert_eq!(parse_response(&fenced).unwrap(), bare);
        assert_eq!(bare.actions.len(), 3);
    }

    #[test]
    fn test_parse_rejects_prose_and_empty() {
        assert!(parse_response("Sure! Taking off now.").is_err());
        assert!(matches!(
            parse_response("```json\n```"),
            Err(IntentError::InvalidResponse(_))
        ));
        assert!(parse_response(r#"{"text": "ok", "actions": [{"type": "barrelRoll"}]}"#).is_err());
    }

    #[tokio::test]
    async fn test_remote_result_used_when_valid() {
        let fenced = format!("```json\n{TAKEOFF_JSON}\n```");
        let model = Arc::new(ScriptedModel::new().with_reply(fenced));
        let interpreter = RemoteInterpreter::new(model.clone(), fallback());

        let result = interpreter.interpret(&history("go up"), &telemetry()).await;
        assert_eq!(
            result.actions,
            vec![Action::set_mode("GUIDED"), Action::Arm, Action::takeoff(10.0)]
        );

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].context.contains("go up"));
        assert!(prompts[0].context.contains("take off to 30 meters"));
    }

    #[tokio::test]
    async fn test_invalid_json_falls_back_to_latest_utterance() {
        let model = Arc::new(ScriptedModel::new().with_reply("I think you should land."));
        let interpreter = RemoteInterpreter::new(model, fallback());
        let history = history("what's my battery");

        let result = interpreter.interpret(&history, &telemetry()).await;
        let expected = fallback().interpret("what's my battery", &telemetry());
        assert_eq!(result, expected);
        assert!(result.text.contains("11.1V"));
    }

    #[tokio::test]
    async fn test_transport_error_falls_back() {
        let model = Arc::new(ScriptedModel::new().with_failure("connection refused"));
        let interpreter = RemoteInterpreter::new(model, fallback());

        let result = interpreter
            .interpret(&history("fly north 50 meters"), &telemetry())
            .await;
        assert_eq!(result.text, "Flying north for 50 meters.");
        assert_eq!(result.actions.len(), 2);
    }

    #[tokio::test]
    async fn test_schema_mismatch_falls_back() {
        let model = Arc::new(
            ScriptedModel::new().with_reply(r#"{"text": "Arming", "actions": [{"type": "arm", "params": {"force": true}}, {"type": "takeoff", "params": {"altitude": "ten"}}]}"#),
        );
        let interpreter = RemoteInterpreter::new(model, fallback());

        let result = interpreter.interpret(&history("land"), &telemetry()).await;
        assert_eq!(result.actions, vec![Action::set_mode("LAND")]);
    }

    #[tokio::test]
    async fn test_missing_candidate_falls_back() {
        // no scripted replies left -> MissingCandidate
        let interpreter = RemoteInterpreter::new(Arc::new(ScriptedModel::new()), fallback());
        let result = interpreter.interpret(&[], &telemetry()).await;
        assert!(result.actions.is_empty());
        assert!(!result.text.is_empty());
    }
}
