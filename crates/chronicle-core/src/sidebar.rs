//! Sidebar controller: the single long-lived owner of history UI state.
//!
//! Holds the repository, selection, menu and view flags, and is the only
//! place they change. Inbound `newChatMessage` signals are queued by one
//! subscription made at attach time and applied in arrival order by
//! [`Sidebar::pump`], so handlers never close over a stale list.

use std::sync::mpsc::{self, Receiver};

use tracing::{debug, info, warn};

use crate::dismissal::{Bounds, OutsideClickTracker, Point};
use crate::events::{BridgeEvent, EventBus, LoadChat, NewChatMessage, Subscription};
use crate::models::{EntryId, HistoryItem};
use crate::search::filter_entries;
use crate::selection::{successor_position, MenuState, SelectionState};
use crate::store::{HistoryError, HistoryRepository, PersistedStore};

/// Visibility and search flags of the sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub is_open: bool,
    pub is_searching: bool,
    pub search_query: String,
}

impl ViewState {
    pub fn new(is_open: bool) -> Self {
        Self {
            is_open,
            ..Self::default()
        }
    }
}

/// Result of deleting an entry through the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The selected entry was removed. Its successor is now selected and a
    /// `loadChat` was published for it.
    Reselected(EntryId),
    /// Selection still refers to the same entry (or nothing was selected).
    Unchanged,
    /// The list is now empty and the sidebar was reset to its initial state.
    Emptied,
}

pub struct Sidebar<S> {
    repository: HistoryRepository<S>,
    bus: EventBus,
    inbox: Receiver<NewChatMessage>,
    subscription: Subscription,
    view: ViewState,
    initially_open: bool,
    selection: SelectionState,
    menu: MenuState,
    dismissal: OutsideClickTracker,
}

impl<S: PersistedStore> Sidebar<S> {
    /// Mount the sidebar on `bus`. The `newChatMessage` subscription lives
    /// exactly as long as the returned value.
    pub fn attach(repository: HistoryRepository<S>, bus: &EventBus) -> Self {
        let (tx, inbox) = mpsc::channel();
        let subscription = bus.on_new_chat_message(move |msg| {
            // Receiver gone means the sidebar is being torn down
            let _ = tx.send(msg.clone());
        });

        debug!(entries = repository.len(), "sidebar attached");

        Self {
            repository,
            bus: bus.clone(),
            inbox,
            subscription,
            view: ViewState::new(true),
            initially_open: true,
            selection: SelectionState::new(),
            menu: MenuState::new(),
            dismissal: OutsideClickTracker::new(),
        }
    }

    /// Set whether the sidebar starts (and resets to) open.
    pub fn with_open(mut self, open: bool) -> Self {
        self.initially_open = open;
        self.view.is_open = open;
        self
    }

    /// Apply every queued `newChatMessage`, oldest first.
    /// Returns how many entries were appended.
    pub fn pump(&mut self) -> usize {
        let mut appended = 0;
        while let Ok(msg) = self.inbox.try_recv() {
            match self.handle_new_chat(&msg) {
                Ok(Some(_)) => appended += 1,
                Ok(None) => {}
                Err(e) => warn!(error = %e, "failed to record chat message"),
            }
        }
        appended
    }

    /// Record one turn. Payloads without a message are ignored.
    pub fn handle_new_chat(&mut self, msg: &NewChatMessage) -> Result<Option<EntryId>, HistoryError> {
        let Some(message) = msg.message_text() else {
            debug!("ignoring newChatMessage without message");
            return Ok(None);
        };
        self.repository
            .append(message, msg.response.as_deref())
            .map(Some)
    }

    /// Row click: make `id` the active conversation and announce it.
    pub fn select(&mut self, id: EntryId) -> Result<(), HistoryError> {
        let item = self.repository.get(id).ok_or(HistoryError::NotFound(id))?;
        let payload = LoadChat::from_entry(&item.entry);

        self.selection.select(id);
        self.bus.publish(BridgeEvent::LoadChat(payload));
        Ok(())
    }

    /// Remove an entry, keeping selection on the same logical entry.
    ///
    /// Deleting the selected entry moves selection to its successor and
    /// publishes `loadChat` for it. Any open menu is closed.
    pub fn delete(&mut self, id: EntryId) -> Result<DeleteOutcome, HistoryError> {
        let removed = self.repository.delete(id)?;
        self.close_menu();

        if self.repository.is_empty() {
            self.reset();
            return Ok(DeleteOutcome::Emptied);
        }

        if !self.selection.is_selected(id) {
            return Ok(DeleteOutcome::Unchanged);
        }

        let successor = successor_position(removed.position, self.repository.len())
            .and_then(|position| self.repository.item_at(position))
            .map(|item| (item.id, LoadChat::from_entry(&item.entry)));

        match successor {
            Some((next, payload)) => {
                self.selection.select(next);
                self.bus.publish(BridgeEvent::LoadChat(payload));
                debug!(deleted = %id, selected = %next, "reselected after delete");
                Ok(DeleteOutcome::Reselected(next))
            }
            None => {
                self.selection.clear();
                Ok(DeleteOutcome::Unchanged)
            }
        }
    }

    /// Back to the state of a freshly mounted, empty sidebar.
    fn reset(&mut self) {
        self.selection.clear();
        self.close_menu();
        self.view = ViewState::new(self.initially_open);
        info!("history emptied, sidebar reset");
    }

    /// Context-menu gesture: open the menu for `id`, closing any other.
    pub fn open_menu(&mut self, id: EntryId) -> bool {
        if self.repository.get(id).is_none() {
            return false;
        }
        if !self.menu.is_open(id) {
            self.dismissal.clear();
        }
        self.menu.open(id);
        true
    }

    /// Options affordance: toggle the menu for `id`.
    pub fn toggle_menu(&mut self, id: EntryId) {
        if self.repository.get(id).is_some() {
            self.menu.toggle(id);
            self.dismissal.clear();
        }
    }

    fn close_menu(&mut self) {
        self.menu.close();
        self.dismissal.clear();
    }

    /// Record where the open menu for `id` was drawn.
    pub fn register_menu_region(&mut self, id: EntryId, bounds: Bounds) {
        self.dismissal.register(id, bounds);
    }

    /// Global pointer-down. Closes the open menu when the pointer lands
    /// outside it; returns whether it did.
    pub fn pointer_down(&mut self, point: Point) -> bool {
        if self.dismissal.should_dismiss(self.menu.open_for(), point) {
            self.close_menu();
            return true;
        }
        false
    }

    /// Toggle-visibility control. Closing while searching also ends the search.
    pub fn toggle_open(&mut self) {
        self.view.is_open = !self.view.is_open;
        if self.view.is_searching {
            self.view.is_searching = false;
            self.view.search_query.clear();
        }
    }

    /// Search-activation control.
    pub fn toggle_search(&mut self) {
        self.view.is_searching = !self.view.is_searching;
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.view.search_query = query.into();
    }

    /// Entries to render: the filtered view while searching, otherwise all.
    pub fn visible_entries(&self) -> Vec<&HistoryItem> {
        if self.view.is_searching {
            filter_entries(self.repository.items(), &self.view.search_query)
        } else {
            self.repository.items().iter().collect()
        }
    }

    pub fn selected(&self) -> Option<EntryId> {
        self.selection.selected()
    }

    /// Position of the selected entry in the full list.
    pub fn selected_position(&self) -> Option<usize> {
        self.selection
            .selected()
            .and_then(|id| self.repository.position(id))
    }

    pub fn menu_open(&self) -> Option<EntryId> {
        self.menu.open_for()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn repository(&self) -> &HistoryRepository<S> {
        &self.repository
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Unmount: apply anything still queued, drop the subscription and hand
    /// back the repository.
    pub fn detach(mut self) -> HistoryRepository<S> {
        self.pump();
        let Sidebar {
            repository,
            subscription,
            ..
        } = self;
        subscription.unsubscribe();
        debug!("sidebar detached");
        repository
    }
}
