//! Canonical in-memory history list with write-through persistence.
//!
//! Every mutation serializes the full list and writes it before returning.
//! If the write fails the in-memory list is rolled back, so memory and the
//! persisted blob never diverge.

use serde_json::value::RawValue;
use thiserror::Error;
use tracing::{debug, warn};

use super::persisted::{PersistedStore, StoreError};
use crate::models::{ChatEntry, EntryId, HistoryItem};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("entry not found: {0}")]
    NotFound(EntryId),

    #[error("query must not be empty")]
    EmptyQuery,
}

/// What happened while hydrating from the persisted store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationReport {
    /// Elements that passed validation
    pub kept: usize,
    /// Elements dropped for lacking a non-empty `query`
    pub discarded: usize,
    /// The blob could not be read or was not a JSON array
    pub unreadable: bool,
}

/// An entry removed by [`HistoryRepository::delete`], with the position it held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedItem {
    pub position: usize,
    pub item: HistoryItem,
}

pub struct HistoryRepository<S> {
    store: S,
    key: String,
    items: Vec<HistoryItem>,
    hydration: HydrationReport,
}

impl<S: PersistedStore> HistoryRepository<S> {
    /// Hydrate from `store`. Never fails: unreadable or malformed data yields
    /// an empty list, invalid elements are skipped. Problems are logged only.
    pub fn load(store: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let (items, hydration) = Self::hydrate(&store, &key);

        debug!(
            key = %key,
            kept = hydration.kept,
            discarded = hydration.discarded,
            "chat history loaded"
        );

        Self {
            store,
            key,
            items,
            hydration,
        }
    }

    fn hydrate(store: &S, key: &str) -> (Vec<HistoryItem>, HydrationReport) {
        let raw = match store.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return (Vec::new(), HydrationReport::default()),
            Err(e) => {
                warn!(key, error = %e, "failed to read chat history, starting empty");
                return (Vec::new(), Self::unreadable());
            }
        };

        let elements: Vec<Box<RawValue>> = match serde_json::from_str(&raw) {
            Ok(elements) => elements,
            Err(e) => {
                warn!(key, error = %e, "error parsing chat history, starting empty");
                return (Vec::new(), Self::unreadable());
            }
        };

        let total = elements.len();
        let items: Vec<HistoryItem> = elements.into_iter().filter_map(HistoryItem::hydrated).collect();
        let report = HydrationReport {
            kept: items.len(),
            discarded: total - items.len(),
            unreadable: false,
        };

        if report.discarded > 0 {
            debug!(key, discarded = report.discarded, "dropped invalid history entries");
        }

        (items, report)
    }

    fn unreadable() -> HydrationReport {
        HydrationReport {
            unreadable: true,
            ..HydrationReport::default()
        }
    }

    /// Append a new turn stamped with the current instant and persist.
    pub fn append(&mut self, query: &str, response: Option<&str>) -> Result<EntryId, HistoryError> {
        if query.is_empty() {
            return Err(HistoryError::EmptyQuery);
        }

        let item = HistoryItem::new(ChatEntry::new(query, response));
        let id = item.id;
        self.items.push(item);

        if let Err(e) = self.persist() {
            self.items.pop();
            warn!(error = %e, "failed to persist appended entry, rolled back");
            return Err(e);
        }

        debug!(%id, len = self.items.len(), "history entry appended");
        Ok(id)
    }

    /// Remove an entry and persist the shortened list.
    pub fn delete(&mut self, id: EntryId) -> Result<RemovedItem, HistoryError> {
        let position = self.position(id).ok_or(HistoryError::NotFound(id))?;
        let item = self.items.remove(position);

        if let Err(e) = self.persist() {
            self.items.insert(position, item);
            warn!(error = %e, "failed to persist deletion, rolled back");
            return Err(e);
        }

        debug!(%id, position, len = self.items.len(), "history entry deleted");
        Ok(RemovedItem { position, item })
    }

    /// Serialize the full list in the persisted schema. Hydrated elements are
    /// written back exactly as they were read.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    fn persist(&mut self) -> Result<(), HistoryError> {
        let json = self.to_json()?;
        self.store.write(&self.key, &json)?;
        Ok(())
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn item_at(&self, position: usize) -> Option<&HistoryItem> {
        self.items.get(position)
    }

    pub fn hydration(&self) -> &HydrationReport {
        &self.hydration
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Tear down the repository, handing back the store (e.g. to reload from it).
    pub fn into_store(self) -> S {
        self.store
    }
}
