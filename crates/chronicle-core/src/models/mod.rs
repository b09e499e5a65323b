pub mod entry;

pub use entry::{ChatEntry, EntryId, HistoryItem};
