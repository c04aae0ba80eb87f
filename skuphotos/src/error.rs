use drive_core::{ApiErrorClass, DriveError};
use thiserror::Error;

/// Conditions checked locally before any remote call is issued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("folder name is empty")]
    EmptyName,
    #[error("no active session; sign in first")]
    NoActiveScope,
    #[error("no folder is open")]
    NoActiveFolder,
    #[error("a folder named \"{0}\" already exists")]
    NameTaken(String),
    #[error("{0} is not a photo in the open folder")]
    NotInFolder(String),
    #[error("bearer credential is missing")]
    MissingCredential,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),
    #[error("remote operation failed: {0}")]
    Remote(#[from] DriveError),
}

impl EngineError {
    pub fn precondition(&self) -> Option<&PreconditionError> {
        match self {
            EngineError::Precondition(err) => Some(err),
            EngineError::Remote(_) => None,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        match self {
            EngineError::Precondition(err) => *err == PreconditionError::MissingCredential,
            EngineError::Remote(err) => err.classification() == Some(ApiErrorClass::Auth),
        }
    }
}
