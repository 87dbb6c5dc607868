//! Error types for the orchestration client

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures while locating or running the manager executable
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("llamacpp-manager not found in PATH or common locations")]
    ExecutableNotFound,

    #[error("Failed to spawn {path}: {source}")]
    SpawnFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {code}")]
    NonZeroExit { command: String, code: i32 },

    #[error("`{command}` did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// Failures while decoding `status --json` output
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Status output is not a valid record list: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Duplicate entry name in status output: {0}")]
    DuplicateName(String),
}

/// Uniform error returned by [`crate::FleetClient`]
#[derive(Error, Debug)]
pub enum FleetError {
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// The original failure kind behind a [`FleetError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ExecutableNotFound,
    SpawnFailure,
    NonZeroExit,
    DecodeFailure,
    Timeout,
}

impl FleetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FleetError::Invoke(InvokeError::ExecutableNotFound) => ErrorKind::ExecutableNotFound,
            FleetError::Invoke(InvokeError::SpawnFailure { .. }) => ErrorKind::SpawnFailure,
            FleetError::Invoke(InvokeError::NonZeroExit { .. }) => ErrorKind::NonZeroExit,
            FleetError::Invoke(InvokeError::Timeout { .. }) => ErrorKind::Timeout,
            FleetError::Decode(_) => ErrorKind::DecodeFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_preserved_through_wrapping() {
        let err: FleetError = InvokeError::NonZeroExit {
            command: "start m1".to_string(),
            code: 2,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NonZeroExit);
        assert_eq!(err.to_string(), "`start m1` exited with status 2");

        let err: FleetError = DecodeError::DuplicateName("m1".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);

        let err: FleetError = InvokeError::ExecutableNotFound.into();
        assert_eq!(err.kind(), ErrorKind::ExecutableNotFound);
    }
}
