//! Shipment lifecycle state.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when an integer does not map to a [`ShipmentState`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid state value: {0}")]
pub struct StateError(pub i64);

/// The lifecycle state of a shipment, as reported by the broker.
///
/// On the wire the broker represents states as integers 0-3 (sometimes as
/// decimal strings); all inbound values are normalized to `i64` and pass
/// through [`ShipmentState::from_i64`].
///
/// `Delivered` is terminal for the on-time-delivery statistic, but the
/// model does not forbid further transfers of a delivered shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentState {
    /// The shipment has been created.
    Created,
    /// The shipment is in transit.
    InTransit,
    /// The shipment is stored in a warehouse.
    Stored,
    /// The shipment has been delivered.
    Delivered,
}

impl ShipmentState {
    /// Convert a broker integer (0-3) to a state.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] for values outside 0-3.
    pub const fn from_i64(value: i64) -> Result<Self, StateError> {
        match value {
            0 => Ok(Self::Created),
            1 => Ok(Self::InTransit),
            2 => Ok(Self::Stored),
            3 => Ok(Self::Delivered),
            other => Err(StateError(other)),
        }
    }

    /// The broker wire representation of this state.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Created => 0,
            Self::InTransit => 1,
            Self::Stored => 2,
            Self::Delivered => 3,
        }
    }

    /// Canonical upper-case name, matching what is stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::InTransit => "IN_TRANSIT",
            Self::Stored => "STORED",
            Self::Delivered => "DELIVERED",
        }
    }

    /// Parse the canonical upper-case name.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] (with value -1) for unknown names.
    pub fn parse(s: &str) -> Result<Self, StateError> {
        match s {
            "CREATED" => Ok(Self::Created),
            "IN_TRANSIT" => Ok(Self::InTransit),
            "STORED" => Ok(Self::Stored),
            "DELIVERED" => Ok(Self::Delivered),
            _ => Err(StateError(-1)),
        }
    }
}

impl fmt::Display for ShipmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_i64_in_range() {
        assert_eq!(ShipmentState::from_i64(0), Ok(ShipmentState::Created));
        assert_eq!(ShipmentState::from_i64(1), Ok(ShipmentState::InTransit));
        assert_eq!(ShipmentState::from_i64(2), Ok(ShipmentState::Stored));
        assert_eq!(ShipmentState::from_i64(3), Ok(ShipmentState::Delivered));
    }

    #[test]
    fn test_from_i64_out_of_range() {
        assert_eq!(ShipmentState::from_i64(-1), Err(StateError(-1)));
        assert_eq!(ShipmentState::from_i64(4), Err(StateError(4)));
        assert_eq!(ShipmentState::from_i64(i64::MAX), Err(StateError(i64::MAX)));
    }

    #[test]
    fn test_wire_roundtrip() {
        for value in 0..=3 {
            let state = ShipmentState::from_i64(value).unwrap();
            assert_eq!(state.as_i64(), value);
        }
    }

    #[test]
    fn test_name_roundtrip() {
        for state in [
            ShipmentState::Created,
            ShipmentState::InTransit,
            ShipmentState::Stored,
            ShipmentState::Delivered,
        ] {
            assert_eq!(ShipmentState::parse(state.as_str()), Ok(state));
        }
        assert!(ShipmentState::parse("LOST").is_err());
    }
}
