//! Mirror-record queries and shipment statistics.

use chrono::{Duration, Local, NaiveTime};
use serde::Serialize;

use blocked_supply_core::{ShipmentId, ShipmentState, UserId};

use crate::db::shipments::ShipmentRecordRepository;
use crate::error::{AppError, Result};
use crate::models::ShipmentRecord;
use crate::state::AppState;

/// Aggregate shipment statistics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentStatistics {
    pub total_shipments: i64,
    /// Records not yet DELIVERED.
    pub active_shipments: i64,
    /// DELIVERED records created within the current local calendar day.
    pub delivered_today: i64,
    /// Whole percent of delivered shipments that arrived on time, as
    /// `"42 %"`.
    pub success_rate: String,
}

/// Mirror-record query service.
pub struct RecordService<'a> {
    state: &'a AppState,
}

impl<'a> RecordService<'a> {
    /// Create a new record service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Get one mirror record by shipment id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when no record exists.
    pub async fn get(&self, shipment_id: ShipmentId) -> Result<ShipmentRecord> {
        ShipmentRecordRepository::new(self.state.pool())
            .get_by_id(shipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Shipment record not found".to_string()))
    }

    /// Compute aggregate statistics over all mirror records.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if any query fails.
    pub async fn statistics(&self) -> Result<ShipmentStatistics> {
        let records = ShipmentRecordRepository::new(self.state.pool());

        let total_shipments = records.count().await?;
        let active_shipments = records.count_not_in_state(ShipmentState::Delivered).await?;

        let (day_start, day_end) = local_day_bounds()?;
        let delivered_today = records
            .count_in_state_created_between(ShipmentState::Delivered, day_start, day_end)
            .await?;

        let delivered = records.list_delivered().await?;
        let success_rate = format!("{} %", success_percent(&delivered));

        Ok(ShipmentStatistics {
            total_shipments,
            active_shipments,
            delivered_today,
            success_rate,
        })
    }

    /// All records the user participates in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when the user has no shipments.
    pub async fn by_participant(&self, user_id: UserId) -> Result<Vec<ShipmentRecord>> {
        let list = ShipmentRecordRepository::new(self.state.pool())
            .list_by_participant(user_id)
            .await?;
        if list.is_empty() {
            return Err(AppError::NotFound("No shipments found for user".to_string()));
        }
        Ok(list)
    }

    /// All records the user currently owns.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when the user owns no shipments.
    pub async fn by_owner(&self, user_id: UserId) -> Result<Vec<ShipmentRecord>> {
        let list = ShipmentRecordRepository::new(self.state.pool())
            .list_by_owner(user_id)
            .await?;
        if list.is_empty() {
            return Err(AppError::NotFound("No shipments found for user".to_string()));
        }
        Ok(list)
    }
}

/// Unix-second bounds of the current local calendar day, inclusive.
fn local_day_bounds() -> Result<(i64, i64)> {
    let start = Local::now()
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| AppError::Internal("ambiguous local midnight".to_string()))?;
    let end = start + Duration::days(1) - Duration::seconds(1);
    Ok((start.timestamp(), end.timestamp()))
}

/// Whole percent of delivered records with `delivered_at <= delivery_date`,
/// rounded down. Zero when nothing was delivered.
fn success_percent(delivered: &[ShipmentRecord]) -> i64 {
    let with_timestamp: Vec<_> = delivered
        .iter()
        .filter_map(|r| r.delivered_at.map(|at| (at, r.delivery_date)))
        .collect();
    if with_timestamp.is_empty() {
        return 0;
    }

    let on_time = with_timestamp
        .iter()
        .filter(|(at, deadline)| at <= deadline)
        .count();
    #[allow(clippy::cast_possible_wrap)]
    let percent = (on_time * 100 / with_timestamp.len()) as i64;
    percent
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn delivered(on_time: bool) -> ShipmentRecord {
        let deadline = Utc::now();
        let mut record = ShipmentRecord::new(
            ShipmentId::new(1),
            "enc".to_string(),
            deadline,
            UserId::new(1),
        );
        record.state = ShipmentState::Delivered;
        record.delivered_at = Some(if on_time {
            deadline - Duration::hours(2)
        } else {
            deadline + Duration::hours(2)
        });
        record
    }

    #[test]
    fn test_success_percent_floors() {
        // 2 of 3 on time -> 66, not 67
        let records = vec![delivered(true), delivered(true), delivered(false)];
        assert_eq!(success_percent(&records), 66);
    }

    #[test]
    fn test_success_percent_empty_is_zero() {
        assert_eq!(success_percent(&[]), 0);
    }

    #[test]
    fn test_delivery_on_deadline_counts_as_on_time() {
        let mut record = delivered(true);
        record.delivered_at = Some(record.delivery_date);
        assert_eq!(success_percent(&[record]), 100);
    }

    #[test]
    fn test_local_day_bounds_cover_a_day() {
        let (start, end) = local_day_bounds().unwrap();
        assert_eq!(end - start, 86_399);
    }
}
