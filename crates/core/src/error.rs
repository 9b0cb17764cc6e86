//! Error taxonomy shared by the store, the metadata client and the schema.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures surfaced by [`crate::catalog::RecordStore`] and [`crate::catalog::CatalogSync`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// One or more required fields are empty.
    #[error("missing essential fields: {}", .0.join(", "))]
    Validation(Vec<&'static str>),
    /// Another record already uses this original torrent name.
    #[error("a record with original torrent name '{0}' already exists")]
    DuplicateKey(String),
    /// No record carries the requested original torrent name.
    #[error("no record with original torrent name '{0}'")]
    NotFound(String),
    /// Reading or writing one of the catalog files failed.
    #[error("failed to {action} {}: {source}", .path.display())]
    Persistence {
        /// Short verb describing the attempted operation.
        action: &'static str,
        /// File involved in the failure.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: PersistenceCause,
    },
}

impl StoreError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, err: io::Error) -> Self {
        Self::Persistence {
            action,
            path: path.into(),
            source: PersistenceCause::Io(err),
        }
    }

    pub(crate) fn json(
        action: &'static str,
        path: impl Into<PathBuf>,
        err: serde_json::Error,
    ) -> Self {
        Self::Persistence {
            action,
            path: path.into(),
            source: PersistenceCause::Json(err),
        }
    }

    /// True when the error came from content that is not a valid record list.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::Persistence {
                source: PersistenceCause::Json(_),
                ..
            }
        )
    }
}

/// Low-level cause of a [`StoreError::Persistence`].
#[derive(Debug, Error)]
pub enum PersistenceCause {
    /// Filesystem error.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// JSON encoding or decoding error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failures of a single metadata provider request.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key was configured, so no request is attempted.
    #[error("no API key configured for the metadata provider (set GAMECAT_API_KEY or api_key in the config file)")]
    MissingApiKey,
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("HTTP {0}: {1}")]
    Status(u16, String),
    /// The response body was not the expected JSON.
    #[error("malformed response: {0}")]
    Parse(String),
    /// The response was well formed but empty.
    #[error("no game found for '{0}'")]
    NotFound(String),
}

/// Failures converting user-entered text into a record field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    /// The field name is not part of the editable record schema.
    #[error("unknown field '{0}'")]
    UnknownField(String),
    /// The field is required but the input was empty.
    #[error("{0} cannot be empty")]
    Required(&'static str),
    /// The input could not be interpreted for the field's type.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Field being edited.
        field: String,
        /// Human-readable explanation.
        reason: String,
    },
}
