use crate::{AssistantError, Result};
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

#[derive(Clone)]
pub struct AssistantMetrics {
    pub pipeline_runs: IntCounter,
    pub pipeline_errors: IntCounter,
    pub actions_dispatched: IntCounter,
    pub action_failures: IntCounter,
}

#[derive(Clone)]
pub struct MetricsHub {
    pub registry: Registry,
    pub assistant: AssistantMetrics,
}

fn counter(name: &str, help: &str) -> Result<IntCounter> {
    IntCounter::new(name, help)
        .map_err(|e| AssistantError::Metrics(format!("metrics init error: {e}")))
}

impl MetricsHub {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let assistant = AssistantMetrics {
            pipeline_runs: counter("fa_pipeline_runs", "Command pipelines started")?,
            pipeline_errors: counter(
                "fa_pipeline_errors",
                "Command pipelines that ended in an apology",
            )?,
            actions_dispatched: counter("fa_actions_dispatched", "Actions sent to the vehicle")?,
            action_failures: counter("fa_action_failures", "Actions the vehicle rejected")?,
        };
        let _ = registry.register(Box::new(assistant.pipeline_runs.clone()));
        let _ = registry.register(Box::new(assistant.pipeline_errors.clone()));
        let _ = registry.register(Box::new(assistant.actions_dispatched.clone()));
        let _ = registry.register(Box::new(assistant.action_failures.clone()));
        Ok(Self {
            registry,
            assistant,
        })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
