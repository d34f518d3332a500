//! flight-assistant: natural-language command pipeline for an uncrewed vehicle
//!
//! This crate ties the interpreters from `intent-parser` to a
//! [`vehicle_control::VehicleControl`] implementation:
//! - [`ActionDispatcher`] executes interpreted actions in order, isolating failures
//! - [`Conversation`] owns the transcript and runs one command pipeline at a time
//! - [`MetricsHub`] counts pipeline runs and dispatch outcomes
//! - [`AssistantConfig`] loads YAML configuration

mod error;
pub use error::{AssistantError, Result};

pub mod config;
pub use config::AssistantConfig;

mod dispatcher;
pub use dispatcher::{ActionDispatcher, ActionOutcome, DispatchReport};

mod conversation;
pub use conversation::{
    Conversation, ConversationState, SubmitOutcome, APOLOGY_TEXT, WELCOME_TEXT,
};

mod metrics;
pub use metrics::{AssistantMetrics, MetricsHub};

/// Initialize the flight assistant system
pub fn init() -> Result<()> {
    tracing::info!("Initializing Flight Assistant system");
    Ok(())
}
