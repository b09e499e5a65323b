//! Chat history synchronization core.
//!
//! Owns the persisted list of past conversation turns and keeps three
//! observers consistent: the persisted store, the sidebar list and the
//! active-conversation view (reached only through the event bridge).

pub mod config;
pub mod constants;
pub mod dismissal;
pub mod events;
pub mod models;
pub mod search;
pub mod selection;
pub mod sidebar;
pub mod store;
pub mod tracing_setup;

pub use config::CoreConfig;
pub use events::{BridgeEvent, EventBus, LoadChat, NewChatMessage, Subscription, Topic};
pub use models::{ChatEntry, EntryId, HistoryItem};
pub use sidebar::{DeleteOutcome, Sidebar};
pub use store::{FileStore, HistoryError, HistoryRepository, MemoryStore, PersistedStore, StoreError};
