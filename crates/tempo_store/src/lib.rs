//! # Tempo Store
//!
//! The reducer-driven state store of the Tempo sync core.
//!
//! This crate provides:
//! - [`AppState`], the immutable snapshot of everything the app knows,
//!   with structural sharing between snapshots
//! - [`Store`], which owns the current snapshot and serializes
//!   reduce-swap-notify transitions
//! - [`Dispatcher`], the authorized entry point actions go through
//! - [`RequestInfo`] and [`Settings`] with their patch types
//!
//! ## Key Invariants
//!
//! - Reducers are pure; side effects live in subscribers
//! - State transitions are linearizable: one dispatch at a time
//! - Merges are idempotent; tombstones remove, everything else overwrites
//! - `next_download_from <= download_from` always holds

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod app_state;
mod dispatcher;
mod error;
mod request_info;
mod settings;
mod store;

pub use action::{Action, ActionKind, SourceType};
pub use app_state::{AppState, EntryInfo, RichTimeEntry};
pub use dispatcher::Dispatcher;
pub use error::{StoreError, StoreResult};
pub use request_info::{AuthKind, AuthResult, RequestInfo, RequestInfoUpdate, ServerRequest};
pub use settings::{Settings, SettingsUpdate};
pub use store::{reduce, Reducer, Store, Subscriber};
