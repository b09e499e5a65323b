pub mod history;
pub mod persisted;

pub use history::{HistoryError, HistoryRepository, HydrationReport, RemovedItem};
pub use persisted::{FileStore, MemoryStore, PersistedStore, StoreError};
