use crate::{Result, VehicleTelemetrySnapshot};
use async_trait::async_trait;
use std::sync::Arc;

/// Listener invoked with a fresh snapshot after every state change.
pub type StateCallback = Arc<dyn Fn(&VehicleTelemetrySnapshot) + Send + Sync>;

/// Async vehicle-control interface.
///
/// Commands may be rejected by the vehicle; callers decide whether a rejection
/// aborts anything. `current_state` is a synchronous point-in-time read.
#[async_trait]
pub trait VehicleControl: Send + Sync {
    /// Read the current vehicle state.
    fn current_state(&self) -> Result<VehicleTelemetrySnapshot>;

    /// Register a state-change listener. Dropping the handle unsubscribes.
    fn subscribe(&self, callback: StateCallback) -> Subscription;

    async fn arm(&self) -> Result<()>;

    async fn disarm(&self) -> Result<()>;

    /// Climb to `altitude_m` meters above home.
    async fn takeoff(&self, altitude_m: f64) -> Result<()>;

    async fn return_to_launch(&self) -> Result<()>;

    /// Switch flight mode by autopilot mode name.
    async fn set_mode(&self, mode: &str) -> Result<()>;

    /// Fly to a position in degrees at `alt` meters.
    async fn fly_to(&self, lat: f64, lon: f64, alt: f64) -> Result<()>;
}

/// Handle returned by [`VehicleControl::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle that owns no listener.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
