//! Conversation orchestrator: transcript, run guard and the command pipeline

use crate::{ActionDispatcher, AssistantMetrics, Result};
use intent_parser::{InterpretationResult, Interpreter, Message};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use vehicle_control::VehicleControl;

pub const WELCOME_TEXT: &str =
    "Hello! I'm your ArduPilot AI Assistant. How can I help you with your drone today?";

pub const APOLOGY_TEXT: &str =
    "I'm sorry, I encountered an error processing your request. Please try again.";

const WELCOME_ID: &str = "welcome";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    Processing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank input; nothing was recorded
    Ignored,
    /// Another submission is still being processed
    Busy,
    /// The assistant message appended for this submission
    Replied(Message),
}

/// Holds the run slot; releasing happens on drop so every exit path
/// returns the conversation to `Idle`.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One operator conversation bound to one vehicle.
///
/// Submissions run one at a time: user message, telemetry snapshot,
/// interpretation over the whole history, sequential dispatch, assistant
/// reply. Each accepted submission appends exactly one assistant message.
pub struct Conversation {
    interpreter: Arc<dyn Interpreter>,
    vehicle: Arc<dyn VehicleControl>,
    dispatcher: ActionDispatcher,
    transcript: Mutex<Vec<Message>>,
    running: AtomicBool,
    metrics: Option<AssistantMetrics>,
}

impl Conversation {
    pub fn new(interpreter: Arc<dyn Interpreter>, vehicle: Arc<dyn VehicleControl>) -> Self {
        Self {
            interpreter,
            dispatcher: ActionDispatcher::new(vehicle.clone()),
            vehicle,
            transcript: Mutex::new(vec![Message::assistant(WELCOME_TEXT).with_id(WELCOME_ID)]),
            running: AtomicBool::new(false),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: AssistantMetrics) -> Self {
        self.dispatcher = self.dispatcher.with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    pub fn state(&self) -> ConversationState {
        if self.running.load(Ordering::Acquire) {
            ConversationState::Processing
        } else {
            ConversationState::Idle
        }
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.lock_transcript().clone()
    }

    pub fn interpreter_name(&self) -> &'static str {
        self.interpreter.name()
    }

    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        let input = input.trim();
        if input.is_empty() {
            return SubmitOutcome::Ignored;
        }
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            tracing::debug!("submission rejected, pipeline busy");
            return SubmitOutcome::Busy;
        };
        if let Some(m) = &self.metrics {
            m.pipeline_runs.inc();
        }

        let history = {
            let mut transcript = self.lock_transcript();
            transcript.push(Message::user(input));
            transcript.clone()
        };
        tracing::info!("Processing command via {}: {}", self.interpreter.name(), input);

        let reply = match self.run_pipeline(&history).await {
            Ok(result) => Message::assistant(result.text),
            Err(e) => {
                tracing::error!("Command pipeline failed: {}", e);
                if let Some(m) = &self.metrics {
                    m.pipeline_errors.inc();
                }
                Message::assistant(APOLOGY_TEXT)
            }
        };

        self.lock_transcript().push(reply.clone());
        tracing::info!("Command processed");
        SubmitOutcome::Replied(reply)
    }

    async fn run_pipeline(&self, history: &[Message]) -> Result<InterpretationResult> {
        let telemetry = self.vehicle.current_state()?;
        let result = self.interpreter.interpret(history, &telemetry).await;

        if !result.actions.is_empty() {
            let report = self.dispatcher.dispatch(&result.actions, &telemetry).await;
            tracing::info!(
                "Dispatched {} action(s), {} failed",
                report.outcomes.len(),
                report.failed()
            );
        }

        Ok(result)
    }

    fn lock_transcript(&self) -> MutexGuard<'_, Vec<Message>> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
