//! Blocked Supply server library.
//!
//! Backend for tracking physical shipments whose authoritative state lives
//! on a blockchain behind the broker service. Exposed as a library so the
//! full router can be exercised in integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
