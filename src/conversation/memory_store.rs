//! Process-memory conversation store.

use std::future::ready;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

use crate::conversation::store::{
    ConversationStore, SessionSummary, StoreFuture, StoreResult, retain_recent,
};
use crate::conversation::title::{DEFAULT_TITLE, TitleOrigin, clamp_title, title_from_query};
use crate::conversation::turn::Turn;

#[derive(Clone, Debug)]
struct SessionRecord {
    title: String,
    origin: TitleOrigin,
    turns: Vec<Turn>,
    created_seq: u64,
    last_active: DateTime<Utc>,
}

impl SessionRecord {
    fn new(created_seq: u64) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            origin: TitleOrigin::Default,
            turns: Vec::new(),
            created_seq,
            last_active: Utc::now(),
        }
    }

    fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

/// Volatile store keeping every session in a concurrent map.
///
/// Each session is updated under its own map entry lock, so the
/// append-then-truncate step is atomic per session.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    sessions: DashMap<String, SessionRecord>,
    next_seq: AtomicU64,
}

impl InMemoryConversationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_record(&self) -> SessionRecord {
        SessionRecord::new(self.next_seq.fetch_add(1, Ordering::Relaxed))
    }

    fn evict_before(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, record| record.last_active >= cutoff);
        before.saturating_sub(self.sessions.len())
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn create(&self, id: &str) -> StoreFuture<'_, StoreResult<SessionSummary>> {
        let record = self.next_record();
        let summary = SessionSummary {
            id: id.to_string(),
            title: record.title.clone(),
        };
        self.sessions.insert(id.to_string(), record);
        Box::pin(ready(Ok(summary)))
    }

    fn list(&self) -> StoreFuture<'_, StoreResult<Vec<SessionSummary>>> {
        let mut rows: Vec<(u64, SessionSummary)> = self
            .sessions
            .iter()
            .map(|entry| {
                (
                    entry.value().created_seq,
                    SessionSummary {
                        id: entry.key().clone(),
                        title: entry.value().title.clone(),
                    },
                )
            })
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        Box::pin(ready(Ok(rows.into_iter().map(|(_, summary)| summary).collect())))
    }

    fn append(&self, id: &str, turns: Vec<Turn>) -> StoreFuture<'_, StoreResult<()>> {
        let mut record = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| self.next_record());
        record.turns.extend(turns);
        retain_recent(&mut record.turns);
        record.touch();
        drop(record);
        Box::pin(ready(Ok(())))
    }

    fn get(&self, id: &str) -> StoreFuture<'_, StoreResult<Vec<Turn>>> {
        let turns = self
            .sessions
            .get(id)
            .map(|record| record.turns.clone())
            .unwrap_or_default();
        Box::pin(ready(Ok(turns)))
    }

    fn clear(&self, id: &str) -> StoreFuture<'_, StoreResult<bool>> {
        let found = self.sessions.get_mut(id).is_some_and(|mut record| {
            record.turns.clear();
            record.touch();
            true
        });
        Box::pin(ready(Ok(found)))
    }

    fn delete(&self, id: &str) -> StoreFuture<'_, StoreResult<()>> {
        self.sessions.remove(id);
        Box::pin(ready(Ok(())))
    }

    fn rename(&self, id: &str, title: &str) -> StoreFuture<'_, StoreResult<bool>> {
        let found = self.sessions.get_mut(id).is_some_and(|mut record| {
            record.title = clamp_title(title);
            record.origin = TitleOrigin::Renamed;
            record.touch();
            true
        });
        Box::pin(ready(Ok(found)))
    }

    fn assign_title_from_query(
        &self,
        id: &str,
        query: &str,
    ) -> StoreFuture<'_, StoreResult<bool>> {
        let changed = self.sessions.get_mut(id).is_some_and(|mut record| {
            if !record.origin.accepts_query_title() {
                return false;
            }
            record.title = title_from_query(query);
            record.origin = TitleOrigin::FirstQuery;
            true
        });
        Box::pin(ready(Ok(changed)))
    }

    fn evict_idle(&self, max_idle: Duration) -> StoreFuture<'_, StoreResult<usize>> {
        let removed = TimeDelta::from_std(max_idle)
            .ok()
            .and_then(|idle| Utc::now().checked_sub_signed(idle))
            .map_or(0, |cutoff| self.evict_before(cutoff));
        Box::pin(ready(Ok(removed)))
    }
}
