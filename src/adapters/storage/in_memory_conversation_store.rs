//! In-Memory Conversation Store Adapter
//!
//! Keeps conversation records in a map behind a tokio `RwLock`.
//! Useful for testing, development and the console driver.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::conversation::{ConversationRecord, ConversationStatus};
use crate::domain::foundation::{SessionId, Timestamp};
use crate::ports::{ConversationStore, ListFilter, StoreError};

/// In-memory storage for conversation records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    records: Arc<RwLock<HashMap<SessionId, ConversationRecord>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(&self, record: &ConversationRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.session_id) {
            return Err(StoreError::AlreadyExists(record.session_id));
        }
        records.insert(record.session_id, record.clone());
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<ConversationRecord>, StoreError> {
        Ok(self.records.read().await.get(session_id).cloned())
    }

    async fn update(&self, record: &ConversationRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let slot = records
            .get_mut(&record.session_id)
            .ok_or(StoreError::NotFound(record.session_id))?;
        let mut updated = record.clone();
        updated.updated_at = Timestamp::now();
        *slot = updated;
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(session_id).is_some())
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<ConversationRecord>, StoreError> {
        let records = self.records.read().await;
        let mut matching: Vec<ConversationRecord> = records
            .values()
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    async fn count(&self, status: Option<ConversationStatus>) -> Result<usize, StoreError> {
        let records = self.records.read().await;
        Ok(match status {
            Some(s) => records.values().filter(|r| r.status == s).count(),
            None => records.len(),
        })
    }

    async fn active_session_ids(&self) -> Result<Vec<SessionId>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.status == ConversationStatus::Active)
            .map(|r| r.session_id)
            .collect())
    }

    async fn cleanup_older_than(&self, max_age: Duration) -> Result<usize, StoreError> {
        let cutoff = Timestamp::now().minus_secs(max_age.as_secs() as i64);
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !(r.is_terminal() && r.updated_at.is_before(&cutoff)));
        let removed = before - records.len();
        debug!(removed, "cleaned up finished conversations");
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.records.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(status: ConversationStatus, age_secs: i64) -> ConversationRecord {
        let mut record = ConversationRecord::new();
        match status {
            ConversationStatus::Completed => record.mark_completed().unwrap(),
            ConversationStatus::Escalated => record.mark_escalated("r", None).unwrap(),
            ConversationStatus::Failed => record.mark_failed(None).unwrap(),
            ConversationStatus::Active => {}
        }
        record.updated_at = Timestamp::now().minus_secs(age_secs);
        record
    }

    mod crud {
        use super::*;

        #[tokio::test]
        async fn create_then_get_returns_record() {
            let store = InMemoryConversationStore::new();
            let record = ConversationRecord::new();
            store.create(&record).await.unwrap();

            let loaded = store.get(&record.session_id).await.unwrap().unwrap();
            assert_eq!(loaded, record);
        }

        #[tokio::test]
        async fn duplicate_create_is_rejected() {
            let store = InMemoryConversationStore::new();
            let record = ConversationRecord::new();
            store.create(&record).await.unwrap();

            assert_eq!(
                store.create(&record).await,
                Err(StoreError::AlreadyExists(record.session_id))
            );
        }

        #[tokio::test]
        async fn get_unknown_returns_none() {
            let store = InMemoryConversationStore::new();
            assert!(store.get(&SessionId::new()).await.unwrap().is_none());
        }

        #[tokio::test]
        async fn update_requires_existing_record_and_refreshes_timestamp() {
            let store = InMemoryConversationStore::new();
            let mut record = ConversationRecord::new();
            assert_eq!(
                store.update(&record).await,
                Err(StoreError::NotFound(record.session_id))
            );

            store.create(&record).await.unwrap();
            record.record_attempt("email", Some("a@b.com".into()), true);
            let stale = Timestamp::now().minus_secs(60);
            record.updated_at = stale;
            store.update(&record).await.unwrap();

            let loaded = store.get(&record.session_id).await.unwrap().unwrap();
            assert!(loaded.is_collected("email"));
            assert!(stale.is_before(&loaded.updated_at));
        }

        #[tokio::test]
        async fn delete_reports_whether_removed() {
            let store = InMemoryConversationStore::new();
            let record = ConversationRecord::new();
            store.create(&record).await.unwrap();

            assert!(store.delete(&record.session_id).await.unwrap());
            assert!(!store.delete(&record.session_id).await.unwrap());
        }
    }

    mod queries {
        use super::*;

        #[tokio::test]
        async fn list_filters_sorts_and_limits() {
            let store = InMemoryConversationStore::new();
            let old = finished(ConversationStatus::Completed, 300);
            let new = finished(ConversationStatus::Completed, 10);
            let active = ConversationRecord::new();
            for r in [&old, &new, &active] {
                store.create(r).await.unwrap();
            }

            let completed = store
                .list(ListFilter::default().with_status(ConversationStatus::Completed))
                .await
                .unwrap();
            assert_eq!(completed.len(), 2);
            assert_eq!(completed[0].session_id, new.session_id);

            let limited = store.list(ListFilter::default().with_limit(1)).await.unwrap();
            assert_eq!(limited.len(), 1);
        }

        #[tokio::test]
        async fn count_and_active_ids() {
            let store = InMemoryConversationStore::new();
            let active = ConversationRecord::new();
            store.create(&active).await.unwrap();
            store
                .create(&finished(ConversationStatus::Escalated, 0))
                .await
                .unwrap();

            assert_eq!(store.count(None).await.unwrap(), 2);
            assert_eq!(store.count(Some(ConversationStatus::Escalated)).await.unwrap(), 1);
            assert_eq!(store.active_session_ids().await.unwrap(), vec![active.session_id]);
        }
    }

    mod maintenance {
        use super::*;

        #[tokio::test]
        async fn cleanup_removes_only_old_terminal_records() {
            let store = InMemoryConversationStore::new();
            let mut stale_active = ConversationRecord::new();
            stale_active.updated_at = Timestamp::now().minus_secs(7200);
            let recent = finished(ConversationStatus::Completed, 60);
            let stale = finished(ConversationStatus::Failed, 7200);
            for r in [&stale_active, &recent, &stale] {
                store.create(r).await.unwrap();
            }

            let removed = store.cleanup_older_than(Duration::from_secs(3600)).await.unwrap();

            assert_eq!(removed, 1);
            assert!(store.get(&stale.session_id).await.unwrap().is_none());
            assert!(store.get(&stale_active.session_id).await.unwrap().is_some());
        }

        #[tokio::test]
        async fn clear_empties_store() {
            let store = InMemoryConversationStore::new();
            store.create(&ConversationRecord::new()).await.unwrap();
            store.clear().await.unwrap();
            assert_eq!(store.count(None).await.unwrap(), 0);
        }
    }
}
