//! In-memory history backend

use async_trait::async_trait;
use moodify_common::time::Clock;
use moodify_common::uuid_utils::generate_id;
use moodify_common::{HistoryData, HistoryEntry, HistoryFilters, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{not_found, truncate_to_millis, HistoryPage, HistoryStore};
use crate::pagination::calculate_pagination;

/// History kept in a `Vec`; lost on restart
pub struct MemoryHistoryStore {
    entries: RwLock<Vec<HistoryEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryHistoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            clock,
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn save(&self, data: HistoryData) -> Result<String> {
        data.validate()?;
        let entry = HistoryEntry {
            id: generate_id(),
            data,
            timestamp: truncate_to_millis(self.clock.now()),
        };
        let id = entry.id.clone();
        debug!(entry_id = %id, entry_type = %entry.entry_type(), "History entry saved");
        self.entries.write().await.push(entry);
        Ok(id)
    }

    async fn get_history(&self, filters: &HistoryFilters) -> Result<HistoryPage> {
        let entries = self.entries.read().await;
        let matching: Vec<&HistoryEntry> = entries.iter().filter(|e| filters.matches(e)).collect();

        let pagination = calculate_pagination(matching.len() as u64, filters.page, filters.limit);
        let history = matching
            .into_iter()
            .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
            .take(pagination.limit as usize)
            .cloned()
            .collect();

        Ok(HistoryPage {
            history,
            pagination,
        })
    }

    async fn delete_entry(&self, id: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        let position = entries.iter().position(|e| e.id == id).ok_or_else(not_found)?;
        entries.remove(position);
        debug!(entry_id = %id, "History entry deleted");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn all_entries(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.entries.read().await.clone())
    }
}
