//! Error types for Daily Ascensions.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AscendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Remote store error: {0}")]
    Remote(#[from] crate::sync::SyncError),

    #[error("Not signed in")]
    NotSignedIn,
}

impl AscendError {
    pub fn code(&self) -> i32 {
        match self {
            AscendError::Io(_) => -32006,
            AscendError::Json(_) => -32700,
            AscendError::Config(_) => -32010,
            AscendError::Remote(_) => -32020,
            AscendError::NotSignedIn => -32021,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncError;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            AscendError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk")),
            AscendError::Config("bad".to_string()),
            AscendError::Remote(SyncError::Offline),
            AscendError::NotSignedIn,
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_remote_error_converts() {
        let err: AscendError = SyncError::Offline.into();
        assert_eq!(err.code(), -32020);
        assert!(err.to_string().contains("offline"));
    }
}
