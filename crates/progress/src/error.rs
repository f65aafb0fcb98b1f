//! Errors surfaced at the boundary of the progress subsystem.

use coursetrack_storage::StorageError;

/// Result alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Failure of a boundary operation.
///
/// There is no partial-failure variant: every write is a single-record
/// merge that either commits in full or leaves the prior state untouched.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A course, module or lesson id did not resolve.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation needs a caller identity and none was supplied.
    #[error("Authentication required")]
    Unauthenticated,

    /// The backing store failed. Retrying is left to the caller.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] StorageError),
}

impl ServiceError {
    /// HTTP status a request layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 404,
            ServiceError::Unauthenticated => 401,
            ServiceError::StorageUnavailable(_) => 503,
        }
    }

    /// Whether the same call might succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::StorageUnavailable(_))
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => ServiceError::NotFound(what),
            other => ServiceError::StorageUnavailable(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_map_to_taxonomy() {
        let not_found: ServiceError = StorageError::NotFound("lesson x".into()).into();
        assert!(matches!(not_found, ServiceError::NotFound(ref w) if w == "lesson x"));
        assert_eq!(not_found.status_code(), 404);
        assert!(!not_found.is_retryable());

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let unavailable: ServiceError = StorageError::Io(io).into();
        assert_eq!(unavailable.status_code(), 503);
        assert!(unavailable.is_retryable());

        assert_eq!(ServiceError::Unauthenticated.status_code(), 401);
    }
}
