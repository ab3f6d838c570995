//! Engine error type

use salas_api::{ConflictReason, ErrorKind, NotFoundTarget};
use salas_store::StoreError;
use salas_util::UtilError;
use thiserror::Error;

/// Every way an engine call can fail
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced room, slot, participant or reservation does not exist
    #[error("{0}")]
    NotFound(NotFoundTarget),

    /// Malformed input the caller can correct
    #[error("invalid request: {0}")]
    Validation(String),

    /// A business rule rejected the request
    #[error("rejected: {0}")]
    Conflict(ConflictReason),

    /// Storage failure; nothing was written
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The rejection reason, for conflicts
    pub fn conflict(&self) -> Option<&ConflictReason> {
        match self {
            CoreError::Conflict(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        CoreError::Internal(e.to_string())
    }
}

impl From<UtilError> for CoreError {
    fn from(e: UtilError) -> Self {
        CoreError::Validation(e.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let errors = [
            CoreError::NotFound(NotFoundTarget::TimeSlot { slot_id: 9 }),
            CoreError::Validation("bad".into()),
            CoreError::Conflict(ConflictReason::CapacityExceeded {
                capacity: 2,
                requested: 3,
            }),
            CoreError::Internal("disk".into()),
        ];

        let kinds: Vec<_> = errors.iter().map(CoreError::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::NotFound,
                ErrorKind::Validation,
                ErrorKind::Conflict,
                ErrorKind::Internal
            ]
        );
    }

    #[test]
    fn store_errors_are_internal() {
        let err: CoreError = StoreError::Database("locked".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.conflict().is_none());
    }

    #[test]
    fn malformed_ids_are_validation_errors() {
        let err: CoreError = salas_util::ParticipantId::parse("12ab").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
