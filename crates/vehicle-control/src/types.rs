use serde::{Deserialize, Serialize};
use std::fmt;

/// Point-in-time read of vehicle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleTelemetrySnapshot {
    /// Autopilot flight mode name, e.g. "GUIDED"
    pub mode: String,
    pub armed: bool,
    /// Degrees
    pub latitude: f64,
    /// Degrees
    pub longitude: f64,
    /// Meters above home
    pub altitude: f64,
    /// Degrees in [0, 360)
    pub heading: f64,
    /// m/s
    pub groundspeed: f64,
    /// Volts
    pub battery_voltage: f64,
    /// Percent in [0, 100]
    pub battery_percent: f64,
}

impl Default for VehicleTelemetrySnapshot {
    fn default() -> Self {
        Self {
            mode: "STABILIZE".to_string(),
            armed: false,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            heading: 0.0,
            groundspeed: 0.0,
            battery_voltage: 12.6,
            battery_percent: 100.0,
        }
    }
}

/// Vehicle-control operations, used to tag errors and injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CurrentState,
    Arm,
    Disarm,
    Takeoff,
    ReturnToLaunch,
    SetMode,
    FlyTo,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CurrentState => "current_state",
            Operation::Arm => "arm",
            Operation::Disarm => "disarm",
            Operation::Takeoff => "takeoff",
            Operation::ReturnToLaunch => "return_to_launch",
            Operation::SetMode => "set_mode",
            Operation::FlyTo => "fly_to",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = VehicleTelemetrySnapshot {
            battery_voltage: 11.1,
            battery_percent: 80.0,
            ..Default::default()
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["batteryVoltage"], 11.1);
        assert_eq!(value["batteryPercent"], 80.0);
        assert_eq!(value["groundspeed"], 0.0);
    }
}
