//! Search filter over the history list.
//!
//! Case-insensitive substring matching against an entry's query and, when
//! present, its response. Pure: recomputed on every keystroke and mutation.

use crate::models::{ChatEntry, HistoryItem};

/// Check if text contains a search term, ignoring case.
/// The term is expected to be lowercased already.
pub fn text_contains_term(text: &str, lowered_term: &str) -> bool {
    if lowered_term.is_empty() {
        return true;
    }
    text.to_lowercase().contains(lowered_term)
}

/// Check whether an entry matches a query.
pub fn entry_matches(entry: &ChatEntry, query: &str) -> bool {
    let term = query.to_lowercase();
    matches_lowered(entry, &term)
}

fn matches_lowered(entry: &ChatEntry, term: &str) -> bool {
    text_contains_term(&entry.query, term)
        || entry
            .response
            .as_deref()
            .is_some_and(|response| !response.is_empty() && text_contains_term(response, term))
}

/// Filter items down to those matching `query`, preserving order.
/// An empty query matches everything.
pub fn filter_entries<'a>(items: &'a [HistoryItem], query: &str) -> Vec<&'a HistoryItem> {
    let term = query.to_lowercase();
    items
        .iter()
        .filter(|item| matches_lowered(&item.entry, &term))
        .collect()
}
