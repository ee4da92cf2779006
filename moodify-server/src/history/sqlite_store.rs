//! SQLite history backend
//!
//! Rows live in the `history` table created by `moodify_common::db`. The
//! autoincrement `seq` column defines insertion order.

use async_trait::async_trait;
use chrono::DateTime;
use moodify_common::time::Clock;
use moodify_common::uuid_utils::generate_id;
use moodify_common::{Error, HistoryData, HistoryEntry, HistoryFilters, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::debug;

use super::{not_found, truncate_to_millis, HistoryPage, HistoryStore};
use crate::pagination::calculate_pagination;

type HistoryRow = (String, String, i64, String);

pub struct SqliteHistoryStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteHistoryStore {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn storage_error(e: sqlx::Error) -> Error {
    Error::Storage(e.to_string())
}

/// Append `WHERE` clauses for every set filter
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filters: &HistoryFilters) {
    qb.push(" WHERE 1=1");
    if let Some(entry_type) = filters.entry_type {
        qb.push(" AND entry_type = ").push_bind(entry_type.as_str());
    }
    if let Some(emotion) = filters.emotion {
        qb.push(" AND emotion = ").push_bind(emotion.as_str());
    }
    if let Some(start) = filters.start_date {
        qb.push(" AND timestamp_ms >= ").push_bind(start.timestamp_millis());
    }
    if let Some(end) = filters.end_date {
        qb.push(" AND timestamp_ms <= ").push_bind(end.timestamp_millis());
    }
}

fn row_to_entry((id, entry_type, timestamp_ms, payload): HistoryRow) -> Result<HistoryEntry> {
    let corrupt = |detail: String| Error::Storage(format!("Corrupt history entry {}: {}", id, detail));

    let value: serde_json::Value =
        serde_json::from_str(&payload).map_err(|e| corrupt(e.to_string()))?;
    let data = HistoryData::from_parts(&entry_type, value).map_err(|e| corrupt(e.to_string()))?;
    let timestamp = DateTime::from_timestamp_millis(timestamp_ms)
        .ok_or_else(|| corrupt(format!("timestamp {} out of range", timestamp_ms)))?;

    Ok(HistoryEntry {
        id,
        data,
        timestamp,
    })
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn save(&self, data: HistoryData) -> Result<String> {
        data.validate()?;

        let id = generate_id();
        let timestamp = truncate_to_millis(self.clock.now());
        let payload = match &data {
            HistoryData::Emotion(result) => serde_json::to_string(result)?,
            HistoryData::Recommendation(rec) => serde_json::to_string(rec)?,
        };

        sqlx::query(
            "INSERT INTO history (id, entry_type, emotion, timestamp_ms, payload) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(data.entry_type().as_str())
        .bind(data.emotion().as_str())
        .bind(timestamp.timestamp_millis())
        .bind(&payload)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        debug!(entry_id = %id, entry_type = %data.entry_type(), "History entry saved");
        Ok(id)
    }

    async fn get_history(&self, filters: &HistoryFilters) -> Result<HistoryPage> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM history");
        push_filters(&mut count_query, filters);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;

        let pagination = calculate_pagination(total.max(0) as u64, filters.page, filters.limit);

        let mut select = QueryBuilder::<Sqlite>::new(
            "SELECT id, entry_type, timestamp_ms, payload FROM history",
        );
        push_filters(&mut select, filters);
        select
            .push(" ORDER BY seq ASC LIMIT ")
            .push_bind(i64::from(pagination.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX));

        let rows: Vec<HistoryRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        let history = rows.into_iter().map(row_to_entry).collect::<Result<Vec<_>>>()?;
        Ok(HistoryPage {
            history,
            pagination,
        })
    }

    async fn delete_entry(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM history WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }
        debug!(entry_id = %id, "History entry deleted");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let result = sqlx::query("DELETE FROM history")
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        debug!(removed = result.rows_affected(), "History cleared");
        Ok(())
    }

    async fn all_entries(&self) -> Result<Vec<HistoryEntry>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            "SELECT id, entry_type, timestamp_ms, payload FROM history ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter().map(row_to_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::test_support::{emotion_data, recommendation_data};
    use chrono::{Duration, TimeZone, Utc};
    use moodify_common::db::init_memory_database;
    use moodify_common::time::{parse_date_bound, ManualClock};
    use moodify_common::{Emotion, EntryType};

    async fn store() -> (SqliteHistoryStore, Arc<ManualClock>) {
        let pool = init_memory_database().await.unwrap();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ));
        (SqliteHistoryStore::new(pool, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_save_and_read_back() {
        let (store, clock) = store().await;
        let data = recommendation_data(Emotion::Sad, 3);
        let id = store.save(data.clone()).await.unwrap();

        let entries = store.all_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
        assert_eq!(entries[0].data, data);
        assert_eq!(entries[0].timestamp, clock.now());
    }

    #[tokio::test]
    async fn test_pagination_over_fifty_entries() {
        let (store, _) = store().await;
        for _ in 0..50 {
            store.save(emotion_data(Emotion::Happy)).await.unwrap();
        }

        let mut filters = HistoryFilters {
            limit: 10,
            ..Default::default()
        };
        let page = store.get_history(&filters).await.unwrap();
        assert_eq!(page.history.len(), 10);
        assert_eq!(page.pagination.total, 50);
        assert_eq!(page.pagination.total_pages, 5);
        assert!(page.pagination.has_more);

        filters.page = 5;
        let page = store.get_history(&filters).await.unwrap();
        assert_eq!(page.history.len(), 10);
        assert!(!page.pagination.has_more);

        filters.page = 100;
        let page = store.get_history(&filters).await.unwrap();
        assert!(page.history.is_empty());
        assert!(!page.pagination.has_more);
    }

    #[tokio::test]
    async fn test_filters_by_type_emotion_and_date() {
        let (store, clock) = store().await;
        for _ in 0..3 {
            store.save(emotion_data(Emotion::Angry)).await.unwrap();
            store.save(recommendation_data(Emotion::Happy, 1)).await.unwrap();
            clock.advance(Duration::days(1));
        }

        let by_type = HistoryFilters {
            entry_type: Some(EntryType::Emotion),
            ..Default::default()
        };
        let page = store.get_history(&by_type).await.unwrap();
        assert_eq!(page.history.len(), 3);
        assert!(page.history.iter().all(|e| e.entry_type() == EntryType::Emotion));

        // Nested emotion of recommendation entries is filterable
        let by_emotion = HistoryFilters {
            emotion: Some(Emotion::Happy),
            ..Default::default()
        };
        let page = store.get_history(&by_emotion).await.unwrap();
        assert_eq!(page.pagination.total, 3);
        assert!(page.history.iter().all(|e| e.entry_type() == EntryType::Recommendation));

        // Whole-day bounds on the second day only
        let one_day = HistoryFilters {
            start_date: parse_date_bound("2025-03-02", false),
            end_date: parse_date_bound("2025-03-02", true),
            ..Default::default()
        };
        let page = store.get_history(&one_day).await.unwrap();
        assert_eq!(page.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let (store, _) = store().await;
        let id = store.save(emotion_data(Emotion::Surprised)).await.unwrap();
        store.save(emotion_data(Emotion::Disgust)).await.unwrap();

        store.delete_entry(&id).await.unwrap();
        assert!(matches!(
            store.delete_entry(&id).await.unwrap_err(),
            Error::NotFound(_)
        ));
        assert_eq!(store.all_entries().await.unwrap().len(), 1);

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.all_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_payload_rejected_before_insert() {
        let (store, _) = store().await;
        let mut data = emotion_data(Emotion::Happy);
        if let HistoryData::Emotion(result) = &mut data {
            result.confidence = 1.5;
        }
        assert!(store.save(data).await.unwrap_err().is_validation());
        assert!(store.all_entries().await.unwrap().is_empty());
    }
}
