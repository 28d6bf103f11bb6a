//! Core types for Blocked Supply.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod sku;
pub mod state;

pub use email::{Email, EmailError};
pub use id::*;
pub use sku::Sku;
pub use state::{ShipmentState, StateError};
