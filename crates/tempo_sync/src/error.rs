//! Error types for the sync client.

use tempo_model::{LocalId, RecordKind, RemoteOp};
use thiserror::Error;

/// Errors produced while talking to the remote API.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote API has no endpoint for this kind/operation pair.
    #[error("the server does not support {op:?} for {kind} records")]
    NotSupported {
        /// The record kind.
        kind: RecordKind,
        /// The attempted operation.
        op: RemoteOp,
    },

    /// The server answered with a non-success status.
    #[error("server returned status {status}: {body}")]
    HttpFailure {
        /// HTTP status code.
        status: u16,
        /// Raw response body, useful for diagnostics.
        body: String,
    },

    /// The record has never been created on the server.
    #[error("{kind} record {id} has no server id yet")]
    NoRemoteId {
        /// The record kind.
        kind: RecordKind,
        /// The record's local id.
        id: LocalId,
    },

    /// The transport failed before a response was produced.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A request or response body could not be (de)serialized.
    #[error("payload could not be decoded: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for sync results.
pub type SyncResult<T> = Result<T, SyncError>;
