//! # Tempo Model
//!
//! Domain records and wire serialization for the Tempo sync core.
//!
//! This crate provides:
//! - The nine domain record types (workspaces, clients, projects, tasks,
//!   tags, time entries, users, membership rows)
//! - Stable local identifiers ([`LocalId`]) and server identifiers
//!   ([`RemoteId`]), with foreign keys kept in local/remote pairs
//! - The [`SyncRecord`] capability trait the sync client dispatches on
//! - The [`DomainRecord`] closed union used for heterogeneous merge batches
//!
//! ## Key Invariants
//!
//! - Local ids are assigned at creation and never reassigned
//! - Foreign keys between records are always local ids
//! - Local-only fields never appear on the wire
//! - `deleted_at != None` is a tombstone, not a physical deletion

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod ids;
mod kind;
mod record;
mod records;

pub use ids::{LocalId, RemoteId};
pub use kind::{RecordKind, RemoteOp};
pub use record::{DomainRecord, SyncRecord};
pub use records::{
    Client, Common, Project, ProjectUser, Tag, Task, TimeEntry, TimeEntryState, TrackingMode,
    User, Workspace, WorkspaceUser,
};
