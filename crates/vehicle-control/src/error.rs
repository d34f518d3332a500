use crate::Operation;
use thiserror::Error;

pub type Result<T, E = VehicleError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum VehicleError {
    #[error("{op} rejected: {reason}")]
    Rejected { op: Operation, reason: String },
    #[error("unknown flight mode: {0}")]
    UnknownMode(String),
    #[error("vehicle link lost: {0}")]
    LinkLost(String),
    #[error("injected fault on {0}")]
    Injected(Operation),
}

impl VehicleError {
    pub(crate) fn rejected(op: Operation, reason: impl Into<String>) -> Self {
        Self::Rejected {
            op,
            reason: reason.into(),
        }
    }
}
