//! In-process simulated vehicle for development and testing

use crate::{
    Operation, Result, StateCallback, Subscription, VehicleControl, VehicleError,
    VehicleTelemetrySnapshot,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Mode names the simulated autopilot accepts.
pub const KNOWN_MODES: &[&str] = &[
    "STABILIZE",
    "ALTHOLD",
    "LOITER",
    "RTL",
    "AUTO",
    "GUIDED",
    "LAND",
];

/// Initial conditions and battery model for [`SimulatedVehicle`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub home_latitude: f64,
    pub home_longitude: f64,
    pub battery_full_v: f64,
    pub battery_empty_v: f64,
    /// Battery percent consumed by every accepted command
    pub drain_per_command: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            home_latitude: -35.363261,
            home_longitude: 149.165230,
            battery_full_v: 12.6,
            battery_empty_v: 10.5,
            drain_per_command: 0.5,
        }
    }
}

type Listeners = Arc<Mutex<BTreeMap<u64, StateCallback>>>;

/// A vehicle whose commands take effect instantly.
///
/// Rejections mirror the autopilot's basic preconditions (arming state,
/// GUIDED for position commands). Faults can be injected per operation.
pub struct SimulatedVehicle {
    config: SimConfig,
    state: Mutex<VehicleTelemetrySnapshot>,
    listeners: Listeners,
    next_listener: AtomicU64,
    faults: Mutex<HashSet<Operation>>,
    link_up: AtomicBool,
}

impl SimulatedVehicle {
    pub fn new(config: SimConfig) -> Self {
        let state = VehicleTelemetrySnapshot {
            latitude: config.home_latitude,
            longitude: config.home_longitude,
            battery_voltage: config.battery_full_v,
            battery_percent: 100.0,
            ..Default::default()
        };
        Self::with_state(config, state)
    }

    /// Start from an explicit snapshot instead of the home position.
    pub fn with_state(config: SimConfig, state: VehicleTelemetrySnapshot) -> Self {
        Self {
            config,
            state: Mutex::new(state),
            listeners: Arc::new(Mutex::new(BTreeMap::new())),
            next_listener: AtomicU64::new(0),
            faults: Mutex::new(HashSet::new()),
            link_up: AtomicBool::new(true),
        }
    }

    /// Make the next call of `op` fail with [`VehicleError::Injected`].
    pub fn fail_next(&self, op: Operation) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert(op);
        }
    }

    /// Simulate telemetry link loss; `current_state` fails while down.
    pub fn set_link(&self, up: bool) {
        self.link_up.store(up, Ordering::SeqCst);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or_default()
    }

    fn take_fault(&self, op: Operation) -> Result<()> {
        let injected = self
            .faults
            .lock()
            .map(|mut faults| faults.remove(&op))
            .unwrap_or(false);
        if injected {
            tracing::debug!("sim: injected fault on {}", op);
            return Err(VehicleError::Injected(op));
        }
        Ok(())
    }

    /// Apply `change` under the state lock, then notify listeners outside it.
    fn apply<F>(&self, op: Operation, change: F) -> Result<()>
    where
        F: FnOnce(&mut VehicleTelemetrySnapshot) -> Result<()>,
    {
        self.take_fault(op)?;
        let snapshot = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| VehicleError::LinkLost("state lock poisoned".to_string()))?;
            change(&mut *state)?;
            self.drain_battery(&mut *state);
            state.clone()
        };
        tracing::debug!(
            "sim: {} -> mode={} armed={} alt={:.1}",
            op,
            snapshot.mode,
            snapshot.armed,
            snapshot.altitude
        );
        self.notify(&snapshot);
        Ok(())
    }

    fn drain_battery(&self, state: &mut VehicleTelemetrySnapshot) {
        let cfg = &self.config;
        state.battery_percent = (state.battery_percent - cfg.drain_per_command).max(0.0);
        state.battery_voltage = cfg.battery_empty_v
            + (cfg.battery_full_v - cfg.battery_empty_v) * state.battery_percent / 100.0;
    }

    fn notify(&self, snapshot: &VehicleTelemetrySnapshot) {
        let callbacks: Vec<StateCallback> = match self.listeners.lock() {
            Ok(listeners) => listeners.values().cloned().collect(),
            Err(_) => return,
        };
        for callback in callbacks {
            callback(snapshot);
        }
    }

    fn land_at(state: &mut VehicleTelemetrySnapshot, lat: f64, lon: f64) {
        state.latitude = lat;
        state.longitude = lon;
        state.altitude = 0.0;
        state.groundspeed = 0.0;
        state.armed = false;
    }
}

impl Default for SimulatedVehicle {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

/// Initial bearing from one position to another, degrees in [0, 360).
fn bearing_degrees(from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64 {
    let d_north = to_lat - from_lat;
    let d_east = (to_lon - from_lon) * from_lat.to_radians().cos();
    if d_north == 0.0 && d_east == 0.0 {
        return 0.0;
    }
    d_east.atan2(d_north).to_degrees().rem_euclid(360.0)
}

#[async_trait]
impl VehicleControl for SimulatedVehicle {
    fn current_state(&self) -> Result<VehicleTelemetrySnapshot> {
        if !self.link_up.load(Ordering::SeqCst) {
            return Err(VehicleError::LinkLost("no telemetry heartbeat".to_string()));
        }
        self.take_fault(Operation::CurrentState)?;
        self.state
            .lock()
            .map(|state| state.clone())
            .map_err(|_| VehicleError::LinkLost("state lock poisoned".to_string()))
    }

    fn subscribe(&self, callback: StateCallback) -> Subscription {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        match self.listeners.lock() {
            Ok(mut listeners) => {
                listeners.insert(id, callback);
            }
            Err(_) => return Subscription::detached(),
        }
        let listeners = Arc::clone(&self.listeners);
        Subscription::new(move || {
            if let Ok(mut listeners) = listeners.lock() {
                listeners.remove(&id);
            }
        })
    }

    async fn arm(&self) -> Result<()> {
        self.apply(Operation::Arm, |state| {
            if state.armed {
                return Err(VehicleError::rejected(Operation::Arm, "already armed"));
            }
            state.armed = true;
            Ok(())
        })
    }

    async fn disarm(&self) -> Result<()> {
        self.apply(Operation::Disarm, |state| {
            if state.altitude > 0.5 {
                return Err(VehicleError::rejected(
                    Operation::Disarm,
                    "vehicle is airborne",
                ));
            }
            state.armed = false;
            Ok(())
        })
    }

    async fn takeoff(&self, altitude_m: f64) -> Result<()> {
        self.apply(Operation::Takeoff, |state| {
            if !state.armed {
                return Err(VehicleError::rejected(
                    Operation::Takeoff,
                    "vehicle is not armed",
                ));
            }
            if state.mode != "GUIDED" {
                return Err(VehicleError::rejected(
                    Operation::Takeoff,
                    "takeoff requires GUIDED mode",
                ));
            }
            if !altitude_m.is_finite() || altitude_m <= 0.0 {
                return Err(VehicleError::rejected(
                    Operation::Takeoff,
                    format!("invalid altitude {altitude_m}"),
                ));
            }
            state.altitude = altitude_m;
            Ok(())
        })
    }

    async fn return_to_launch(&self) -> Result<()> {
        let (home_lat, home_lon) = (self.config.home_latitude, self.config.home_longitude);
        self.apply(Operation::ReturnToLaunch, |state| {
            state.heading = bearing_degrees(state.latitude, state.longitude, home_lat, home_lon);
            state.mode = "RTL".to_string();
            Self::land_at(state, home_lat, home_lon);
            Ok(())
        })
    }

    async fn set_mode(&self, mode: &str) -> Result<()> {
        let mode = mode.trim().to_uppercase();
        if !KNOWN_MODES.contains(&mode.as_str()) {
            return Err(VehicleError::UnknownMode(mode));
        }
        let (home_lat, home_lon) = (self.config.home_latitude, self.config.home_longitude);
        self.apply(Operation::SetMode, |state| {
            match mode.as_str() {
                "LAND" => {
                    let (lat, lon) = (state.latitude, state.longitude);
                    Self::land_at(state, lat, lon);
                }
                "RTL" => Self::land_at(state, home_lat, home_lon),
                _ => {}
            }
            state.mode = mode;
            Ok(())
        })
    }

    async fn fly_to(&self, lat: f64, lon: f64, alt: f64) -> Result<()> {
        self.apply(Operation::FlyTo, |state| {
            if !state.armed {
                return Err(VehicleError::rejected(
                    Operation::FlyTo,
                    "vehicle is not armed",
                ));
            }
            if state.mode != "GUIDED" {
                return Err(VehicleError::rejected(
                    Operation::FlyTo,
                    "position targets require GUIDED mode",
                ));
            }
            if !(lat.is_finite() && lon.is_finite() && alt.is_finite()) {
                return Err(VehicleError::rejected(
                    Operation::FlyTo,
                    "non-finite target",
                ));
            }
            state.heading = bearing_degrees(state.latitude, state.longitude, lat, lon);
            state.latitude = lat;
            state.longitude = lon;
            state.altitude = alt;
            Ok(())
        })
    }
}
