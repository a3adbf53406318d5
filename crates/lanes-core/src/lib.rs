//! lanes-core library.
//!
//! A kanban board kept in a total order by fractional positions, with an
//! optimistic store that applies changes locally and reconciles them
//! against a durable remote.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at the domain edges
//!   ([`error::ValidationError`], [`error::RemoteError`]); `anyhow::Result`
//!   inside the SQLite layer.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).
//! - **Time**: epoch milliseconds everywhere ([`model::now_ms`]).

pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod model;
pub mod order;
pub mod remote;
pub mod snapshot;
pub mod store;
