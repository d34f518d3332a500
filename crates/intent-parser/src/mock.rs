//! Scripted language model for development and testing

use crate::{IntentError, LanguageModel, Prompt, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned outputs in order and records every prompt it receives.
///
/// Once the script is exhausted every call fails with
/// [`IntentError::MissingCandidate`].
#[derive(Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw model output
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push_reply(text);
        self
    }

    /// Queue a transport failure
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(message.into()));
        }
        self
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(text.into()));
        }
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }
        let next = self
            .script
            .lock()
            .map_err(|_| IntentError::Transport("script lock poisoned".to_string()))?
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(IntentError::Transport(message)),
            None => Err(IntentError::MissingCandidate),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
