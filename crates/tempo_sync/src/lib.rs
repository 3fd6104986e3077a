//! # Tempo Sync
//!
//! The REST sync client of the Tempo sync core.
//!
//! This crate provides:
//! - [`SyncClient`], which shapes requests for the versioned remote API
//!   and folds server echoes back into local records
//! - The [`HttpTransport`] seam so the embedding application supplies
//!   the actual HTTP stack, with [`MockTransport`] for tests
//! - [`ResponseObserver`] hooks that see every response before status
//!   checking
//! - [`UserRelatedRecords`], the typed payload of an incremental pull
//!
//! ## Key Invariants
//!
//! - Local edits win over stale server echoes when responses merge back
//! - The changes cursor advances on the server's clock, never the device's
//! - Unsupported kind/operation pairs fail before touching the network

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod changes;
mod client;
mod error;
mod transport;

pub use changes::UserRelatedRecords;
pub use client::SyncClient;
pub use error::{SyncError, SyncResult};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, MockTransport, NoopObserver,
    ResponseObserver,
};
