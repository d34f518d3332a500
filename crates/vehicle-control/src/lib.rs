//! vehicle-control: the vehicle-side contract the flight assistant drives
//!
//! This crate provides the telemetry snapshot type, the async [`VehicleControl`]
//! trait and a publish/subscribe handle for state changes. The default build
//! enables a `sim` backend so binaries and tests run without an autopilot link.

mod types;
pub use types::{Operation, VehicleTelemetrySnapshot};

mod error;
pub use error::{Result, VehicleError};

mod traits;
pub use traits::{StateCallback, Subscription, VehicleControl};

#[cfg(feature = "sim")]
mod sim;

#[cfg(feature = "sim")]
pub use sim::{SimConfig, SimulatedVehicle, KNOWN_MODES};
