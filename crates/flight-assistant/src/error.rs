use thiserror::Error;

pub type Result<T, E = AssistantError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("vehicle error: {0}")]
    Vehicle(#[from] vehicle_control::VehicleError),
    #[error("metrics error: {0}")]
    Metrics(String),
}
