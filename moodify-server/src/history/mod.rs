//! History store
//!
//! Append-only log of emotion and recommendation events. Two backends share
//! the [`HistoryStore`] contract: SQLite (default) and process memory.

mod export;
mod memory_store;
mod sqlite_store;

pub use export::{export_history, ExportFormat, ExportedHistory};
pub use memory_store::MemoryHistoryStore;
pub use sqlite_store::SqliteHistoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moodify_common::{HistoryData, HistoryEntry, HistoryFilters, Result};
use serde::Serialize;
use serde_json::Value;

use crate::pagination::Pagination;

/// One page of filtered history
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub history: Vec<HistoryEntry>,
    pub pagination: Pagination,
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append an entry timestamped by the store's clock; returns the new id
    async fn save(&self, data: HistoryData) -> Result<String>;

    /// Filter and paginate in insertion order
    async fn get_history(&self, filters: &HistoryFilters) -> Result<HistoryPage>;

    /// Remove one entry; `NotFound` when the id is unknown
    async fn delete_entry(&self, id: &str) -> Result<()>;

    /// Remove every entry
    async fn clear(&self) -> Result<()>;

    /// Every entry in insertion order
    async fn all_entries(&self) -> Result<Vec<HistoryEntry>>;
}

/// Validate an untyped `{type, data}` payload and append it
pub async fn save_payload(store: &dyn HistoryStore, entry_type: &str, data: Value) -> Result<String> {
    let data = HistoryData::from_parts(entry_type, data)?;
    store.save(data).await
}

/// Timestamps are stored with millisecond precision
fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}

fn not_found() -> moodify_common::Error {
    moodify_common::Error::NotFound("History entry not found".to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use moodify_common::{Emotion, EmotionResult, HistoryData, MusicRecommendation, Track};
    use std::collections::BTreeMap;

    pub fn emotion_data(emotion: Emotion) -> HistoryData {
        let mut all_emotions = BTreeMap::new();
        for e in Emotion::ALL {
            all_emotions.insert(e, if e == emotion { 0.4 } else { 0.1 });
        }
        HistoryData::Emotion(EmotionResult {
            emotion,
            confidence: 0.4,
            all_emotions,
            timestamp: chrono::Utc::now(),
        })
    }

    pub fn recommendation_data(emotion: Emotion, track_count: usize) -> HistoryData {
        let tracks = (0..track_count)
            .map(|i| Track {
                id: format!("t{}", i),
                name: format!("Song, \"{}\"", i),
                artist: "Artist".to_string(),
                album: "Album".to_string(),
                image_url: None,
                preview_url: None,
                spotify_url: format!("https://open.spotify.com/track/t{}", i),
                popularity: None,
                duration: 180_000,
            })
            .collect();
        HistoryData::Recommendation(MusicRecommendation {
            emotion,
            tracks,
            timestamp: chrono::Utc::now(),
        })
    }
}
