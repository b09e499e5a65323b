//! Application-wide constants
//!
//! Centralized location for storage keys, wire names and fallback labels
//! that are used across multiple modules.

/// Key under which the serialized history list is persisted
pub const STORAGE_KEY: &str = "chatHistory";

/// Default directory for the file-backed store
pub const DEFAULT_DATA_DIR: &str = "chronicle_data";

/// Response text used when a turn was recorded without one
pub const NO_RESPONSE: &str = "No response received";

/// Label shown for entries without a usable timestamp
pub const UNKNOWN_TIME: &str = "Unknown time";

// Event bridge topic names
pub const TOPIC_NEW_CHAT_MESSAGE: &str = "newChatMessage";
pub const TOPIC_LOAD_CHAT: &str = "loadChat";

/// Display format for entry timestamps (local time)
pub const TIME_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
