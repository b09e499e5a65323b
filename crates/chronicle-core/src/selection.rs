//! Selection and contextual-menu state for the history list.
//!
//! Both are tracked by [`EntryId`] rather than position, so deleting some
//! other entry never invalidates them. UI-local only; nothing is persisted.

use crate::models::EntryId;

/// Which entry is shown as the active conversation, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<EntryId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: EntryId) {
        self.selected = Some(id);
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<EntryId> {
        self.selected
    }

    pub fn is_selected(&self, id: EntryId) -> bool {
        self.selected == Some(id)
    }
}

/// Which entry's contextual menu is open. At most one at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuState {
    open: Option<EntryId>,
}

impl MenuState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the menu for `id`, replacing any other open menu (context-menu gesture).
    pub fn open(&mut self, id: EntryId) {
        self.open = Some(id);
    }

    /// Options affordance: close if already open for `id`, otherwise open it.
    pub fn toggle(&mut self, id: EntryId) {
        self.open = if self.is_open(id) { None } else { Some(id) };
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn open_for(&self) -> Option<EntryId> {
        self.open
    }

    pub fn is_open(&self, id: EntryId) -> bool {
        self.open == Some(id)
    }
}

/// Position to select after the selected entry at `deleted` was removed,
/// given the number of entries left.
///
/// The entry that slid into the vacated slot is chosen; if the last slot was
/// deleted, the new last entry is. `None` when nothing is left.
pub fn successor_position(deleted: usize, remaining: usize) -> Option<usize> {
    if remaining == 0 {
        None
    } else if deleted >= remaining {
        Some(remaining - 1)
    } else {
        Some(deleted)
    }
}
