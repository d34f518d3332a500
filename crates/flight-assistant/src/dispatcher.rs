//! Sequential execution of interpreted actions against the vehicle

use crate::AssistantMetrics;
use intent_parser::{Action, DEFAULT_MODE, DEFAULT_TAKEOFF_ALTITUDE_M};
use std::sync::Arc;
use vehicle_control::{VehicleControl, VehicleTelemetrySnapshot};

/// Result of one dispatched action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub action: Action,
    /// Vehicle error text when the action was rejected
    pub result: Result<(), String>,
}

/// Per-action outcomes in execution order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub outcomes: Vec<ActionOutcome>,
}

impl DispatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Forwards actions to the vehicle one at a time.
///
/// Each call is awaited before the next starts, since later actions depend
/// on earlier ones (mode, then arm, then takeoff). A rejected action is
/// logged and skipped; it never stops the rest of the list. No retries.
#[derive(Clone)]
pub struct ActionDispatcher {
    vehicle: Arc<dyn VehicleControl>,
    metrics: Option<AssistantMetrics>,
}

impl ActionDispatcher {
    pub fn new(vehicle: Arc<dyn VehicleControl>) -> Self {
        Self {
            vehicle,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: AssistantMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Execute `actions` in order. Missing `flyTo` coordinates are taken
    /// from `telemetry`, the snapshot the actions were interpreted against.
    pub async fn dispatch(
        &self,
        actions: &[Action],
        telemetry: &VehicleTelemetrySnapshot,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for action in actions {
            let result = self.execute(action, telemetry).await;
            if let Some(m) = &self.metrics {
                m.actions_dispatched.inc();
            }
            let result = match result {
                Ok(()) => {
                    tracing::info!("Executed action {}", action);
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!("Failed to execute action {}: {}", action, e);
                    if let Some(m) = &self.metrics {
                        m.action_failures.inc();
                    }
                    Err(e.to_string())
                }
            };
            report.outcomes.push(ActionOutcome {
                action: action.clone(),
                result,
            });
        }

        report
    }

    async fn execute(
        &self,
        action: &Action,
        t: &VehicleTelemetrySnapshot,
    ) -> vehicle_control::Result<()> {
        match action {
            Action::Arm => self.vehicle.arm().await,
            Action::Disarm => self.vehicle.disarm().await,
            Action::Takeoff { altitude } => {
                self.vehicle
                    .takeoff(altitude.unwrap_or(DEFAULT_TAKEOFF_ALTITUDE_M))
                    .await
            }
            Action::Land => self.vehicle.set_mode("LAND").await,
            Action::Rtl => self.vehicle.return_to_launch().await,
            Action::SetMode { mode } => {
                self.vehicle
                    .set_mode(mode.as_deref().unwrap_or(DEFAULT_MODE))
                    .await
            }
            Action::FlyTo { lat, lon, alt } => {
                self.vehicle
                    .fly_to(
                        lat.unwrap_or(t.latitude),
                        lon.unwrap_or(t.longitude),
                        alt.unwrap_or(t.altitude),
                    )
                    .await
            }
        }
    }
}
