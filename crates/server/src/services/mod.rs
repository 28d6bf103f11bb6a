//! Business logic services.

pub mod auth;
pub mod crypto;
pub mod jwt;
pub mod notifications;
pub mod records;
pub mod shipments;
pub mod transfers;
