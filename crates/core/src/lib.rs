//! Blocked Supply Core - Shared types library.
//!
//! This crate provides common types used across the Blocked Supply backend:
//! - `server` - REST API mirroring broker-held shipment state
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. The broker service is the source of truth for shipments; these
//! types describe how the backend mirrors and annotates its data.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, SKUs, and the
//!   shipment lifecycle state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
