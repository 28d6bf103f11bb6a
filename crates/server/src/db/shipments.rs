//! Shipment mirror-record repository.

use sqlx::SqlitePool;

use blocked_supply_core::{ShipmentId, ShipmentState, Sku, UserId};

use super::{RepositoryError, conflict_on_unique, timestamp_to_datetime};
use crate::models::ShipmentRecord;

#[derive(sqlx::FromRow)]
struct ShipmentRow {
    shipment_id: i64,
    sku: String,
    owner_address: String,
    owner_id: i64,
    created_at: i64,
    delivery_date: i64,
    delivered_at: Option<i64>,
    state: String,
    participants: String,
}

impl ShipmentRow {
    fn into_record(self) -> Result<ShipmentRecord, RepositoryError> {
        let state = ShipmentState::parse(&self.state).map_err(|_| {
            RepositoryError::DataCorruption(format!("invalid state in database: {}", self.state))
        })?;

        let participants: Vec<i64> = serde_json::from_str(&self.participants).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid participants in database: {e}"))
        })?;

        Ok(ShipmentRecord {
            shipment_id: ShipmentId::new(self.shipment_id),
            sku: Sku::from_string(self.sku),
            owner_address: self.owner_address,
            owner_id: UserId::new(self.owner_id),
            created_at: timestamp_to_datetime(self.created_at)?,
            delivery_date: timestamp_to_datetime(self.delivery_date)?,
            delivered_at: self.delivered_at.map(timestamp_to_datetime).transpose()?,
            state,
            participants: participants.into_iter().map(UserId::new).collect(),
        })
    }
}

fn participants_json(record: &ShipmentRecord) -> Result<String, RepositoryError> {
    let ids: Vec<i64> = record.participants.iter().map(|p| p.as_i64()).collect();
    serde_json::to_string(&ids).map_err(|e| {
        RepositoryError::DataCorruption(format!("failed to serialize participants: {e}"))
    })
}

/// Repository for shipment mirror records.
pub struct ShipmentRecordRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ShipmentRecordRepository<'a> {
    /// Create a new shipment record repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a mirror record by its broker-assigned shipment id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(
        &self,
        shipment_id: ShipmentId,
    ) -> Result<Option<ShipmentRecord>, RepositoryError> {
        let row =
            sqlx::query_as::<_, ShipmentRow>("SELECT * FROM shipment_records WHERE shipment_id = ?")
                .bind(shipment_id)
                .fetch_optional(self.pool)
                .await?;

        row.map(ShipmentRow::into_record).transpose()
    }

    /// Get a mirror record by its locally generated SKU.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_sku(&self, sku: &str) -> Result<Option<ShipmentRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, ShipmentRow>("SELECT * FROM shipment_records WHERE sku = ?")
            .bind(sku)
            .fetch_optional(self.pool)
            .await?;

        row.map(ShipmentRow::into_record).transpose()
    }

    /// Persist a freshly created mirror record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the shipment id or SKU is
    /// already mirrored, `RepositoryError::Database` for other failures.
    pub async fn insert(&self, record: &ShipmentRecord) -> Result<(), RepositoryError> {
        let participants = participants_json(record)?;

        sqlx::query(
            "INSERT INTO shipment_records \
             (shipment_id, sku, owner_address, owner_id, created_at, delivery_date, delivered_at, state, participants) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.shipment_id)
        .bind(record.sku.as_str())
        .bind(&record.owner_address)
        .bind(record.owner_id)
        .bind(record.created_at.timestamp())
        .bind(record.delivery_date.timestamp())
        .bind(record.delivered_at.map(|t| t.timestamp()))
        .bind(record.state.as_str())
        .bind(participants)
        .execute(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Shipment already mirrored"))?;

        Ok(())
    }

    /// Write back the mutable portion of a mirror record after a transfer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record vanished, or
    /// `RepositoryError::Database` if the update fails.
    pub async fn update(&self, record: &ShipmentRecord) -> Result<(), RepositoryError> {
        let participants = participants_json(record)?;

        let result = sqlx::query(
            "UPDATE shipment_records \
             SET owner_address = ?, owner_id = ?, delivered_at = ?, state = ?, participants = ? \
             WHERE shipment_id = ?",
        )
        .bind(&record.owner_address)
        .bind(record.owner_id)
        .bind(record.delivered_at.map(|t| t.timestamp()))
        .bind(record.state.as_str())
        .bind(participants)
        .bind(record.shipment_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Total number of mirror records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shipment_records")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Number of records not in the given state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_not_in_state(&self, state: ShipmentState) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM shipment_records WHERE state <> ?")
                .bind(state.as_str())
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    /// Number of records in the given state created within `[start, end]`
    /// (unix seconds, inclusive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_in_state_created_between(
        &self,
        state: ShipmentState,
        start: i64,
        end: i64,
    ) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM shipment_records WHERE state = ? AND created_at BETWEEN ? AND ?",
        )
        .bind(state.as_str())
        .bind(start)
        .bind(end)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// All records that reached DELIVERED and have a delivery timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list_delivered(&self) -> Result<Vec<ShipmentRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShipmentRow>(
            "SELECT * FROM shipment_records WHERE state = ? AND delivered_at IS NOT NULL",
        )
        .bind(ShipmentState::Delivered.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ShipmentRow::into_record).collect()
    }

    /// All records where the user appears in the participant set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list_by_participant(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ShipmentRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShipmentRow>(
            "SELECT * FROM shipment_records \
             WHERE EXISTS (SELECT 1 FROM json_each(participants) WHERE json_each.value = ?) \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ShipmentRow::into_record).collect()
    }

    /// All records currently owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list_by_owner(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ShipmentRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShipmentRow>(
            "SELECT * FROM shipment_records WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ShipmentRow::into_record).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::create_pool_in_memory;
    use chrono::{Duration, Utc};

    fn record(id: i64, owner: i64) -> ShipmentRecord {
        ShipmentRecord::new(
            ShipmentId::new(id),
            format!("enc-{owner}"),
            Utc::now() + Duration::days(3),
            UserId::new(owner),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let pool = create_pool_in_memory().await.unwrap();
        let repo = ShipmentRecordRepository::new(&pool);

        let rec = record(1, 10);
        repo.insert(&rec).await.unwrap();

        let loaded = repo.get_by_id(ShipmentId::new(1)).await.unwrap().unwrap();
        assert_eq!(loaded.sku, rec.sku);
        assert_eq!(loaded.owner_id, UserId::new(10));
        assert_eq!(loaded.state, ShipmentState::Created);
        assert_eq!(loaded.participants, vec![UserId::new(10)]);

        let by_sku = repo.get_by_sku(rec.sku.as_str()).await.unwrap().unwrap();
        assert_eq!(by_sku.shipment_id, ShipmentId::new(1));

        assert!(repo.get_by_id(ShipmentId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_shipment_conflicts() {
        let pool = create_pool_in_memory().await.unwrap();
        let repo = ShipmentRecordRepository::new(&pool);

        repo.insert(&record(1, 10)).await.unwrap();
        let err = repo.insert(&record(1, 11)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_after_transfer() {
        let pool = create_pool_in_memory().await.unwrap();
        let repo = ShipmentRecordRepository::new(&pool);

        let mut rec = record(1, 10);
        repo.insert(&rec).await.unwrap();

        rec.state = ShipmentState::Delivered;
        rec.delivered_at = Some(Utc::now());
        rec.owner_address = "enc-20".to_string();
        rec.add_participant(UserId::new(20));
        repo.update(&rec).await.unwrap();

        let loaded = repo.get_by_id(ShipmentId::new(1)).await.unwrap().unwrap();
        assert_eq!(loaded.state, ShipmentState::Delivered);
        assert!(loaded.delivered_at.is_some());
        assert_eq!(loaded.owner_id, UserId::new(20));
        assert_eq!(loaded.participants, vec![UserId::new(10), UserId::new(20)]);
    }

    #[tokio::test]
    async fn test_participant_and_owner_queries() {
        let pool = create_pool_in_memory().await.unwrap();
        let repo = ShipmentRecordRepository::new(&pool);

        let mut rec = record(1, 10);
        repo.insert(&rec).await.unwrap();
        rec.add_participant(UserId::new(20));
        repo.update(&rec).await.unwrap();
        repo.insert(&record(2, 30)).await.unwrap();

        let for_10 = repo.list_by_participant(UserId::new(10)).await.unwrap();
        assert_eq!(for_10.len(), 1);

        let for_20 = repo.list_by_participant(UserId::new(20)).await.unwrap();
        assert_eq!(for_20.len(), 1);

        // 10 is still a participant but no longer the owner
        assert!(repo.list_by_owner(UserId::new(10)).await.unwrap().is_empty());
        assert_eq!(repo.list_by_owner(UserId::new(20)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_counters() {
        let pool = create_pool_in_memory().await.unwrap();
        let repo = ShipmentRecordRepository::new(&pool);

        let mut delivered = record(1, 10);
        delivered.state = ShipmentState::Delivered;
        delivered.delivered_at = Some(Utc::now());
        repo.insert(&delivered).await.unwrap();
        repo.insert(&record(2, 10)).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(
            repo.count_not_in_state(ShipmentState::Delivered).await.unwrap(),
            1
        );
        assert_eq!(repo.list_delivered().await.unwrap().len(), 1);

        let now = Utc::now().timestamp();
        assert_eq!(
            repo.count_in_state_created_between(ShipmentState::Delivered, now - 60, now + 60)
                .await
                .unwrap(),
            1
        );
    }
}
