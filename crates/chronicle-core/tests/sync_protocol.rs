use std::sync::Arc;

use chronicle_core::constants::{NO_RESPONSE, STORAGE_KEY};
use chronicle_core::search::filter_entries;
use chronicle_core::{
    BridgeEvent, DeleteOutcome, EntryId, EventBus, FileStore, HistoryRepository, LoadChat,
    MemoryStore, NewChatMessage, Sidebar, Subscription,
};
use parking_lot::Mutex;
use tempfile::tempdir;

/// Sidebar on a private bus plus a recorder standing in for the conversation view.
struct Harness {
    bus: EventBus,
    sidebar: Sidebar<MemoryStore>,
    loaded: Arc<Mutex<Vec<LoadChat>>>,
    _view: Subscription,
}

impl Harness {
    fn with_entries(queries: &[&str]) -> Self {
        let bus = EventBus::new();
        let loaded = Arc::new(Mutex::new(Vec::new()));
        let sink = loaded.clone();
        let view = bus.on_load_chat(move |payload| sink.lock().push(payload.clone()));

        let repo = HistoryRepository::load(MemoryStore::new(), STORAGE_KEY);
        let mut sidebar = Sidebar::attach(repo, &bus);
        for q in queries {
            bus.publish(BridgeEvent::NewChatMessage(NewChatMessage::new(
                *q,
                Some(format!("{q} response")),
            )));
        }
        sidebar.pump();

        Self {
            bus,
            sidebar,
            loaded,
            _view: view,
        }
    }

    fn id_at(&self, position: usize) -> EntryId {
        self.sidebar.repository().item_at(position).unwrap().id
    }

    fn queries(&self) -> Vec<String> {
        self.sidebar
            .repository()
            .items()
            .iter()
            .map(|i| i.entry.query.clone())
            .collect()
    }

    fn take_loaded(&self) -> Vec<LoadChat> {
        std::mem::take(&mut *self.loaded.lock())
    }
}

#[test]
fn append_then_reload_yields_equal_entry() {
    let dir = tempdir().unwrap();
    let bus = EventBus::new();
    let repo = HistoryRepository::load(FileStore::new(dir.path()), STORAGE_KEY);
    let mut sidebar = Sidebar::attach(repo, &bus);

    bus.publish(BridgeEvent::NewChatMessage(NewChatMessage::new(
        "How do lifetimes work?",
        Some("They scope borrows.".to_string()),
    )));
    sidebar.pump();

    let repo = sidebar.detach();
    let appended = repo.items()[0].entry.clone();
    assert!(appended.timestamp.is_some());

    let reloaded = HistoryRepository::load(FileStore::new(dir.path()), STORAGE_KEY);
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.items()[0].entry, appended);
}

#[test]
fn persisted_blob_matches_memory_after_every_mutation() {
    let mut h = Harness::with_entries(&["a", "b", "c"]);
    let expected = h.sidebar.repository().to_json().unwrap();
    assert_eq!(h.sidebar.repository().store().get(STORAGE_KEY), Some(expected.as_str()));

    let b = h.id_at(1);
    h.sidebar.delete(b).unwrap();
    let expected = h.sidebar.repository().to_json().unwrap();
    assert_eq!(h.sidebar.repository().store().get(STORAGE_KEY), Some(expected.as_str()));
}

#[test]
fn loading_drops_entries_without_query() {
    let raw = r#"[
        {"query":"kept","response":"yes","timestamp":"2024-03-01T08:00:00.000Z"},
        {"response":"orphaned","timestamp":"2024-03-01T08:01:00.000Z"}
    ]"#;
    let repo = HistoryRepository::load(MemoryStore::with_value(STORAGE_KEY, raw), STORAGE_KEY);

    assert_eq!(repo.len(), 1);
    assert_eq!(repo.items()[0].entry.query, "kept");
}

#[test]
fn corrupt_blob_loads_empty_and_recovers_on_append() {
    let store = MemoryStore::with_value(STORAGE_KEY, "][ definitely not json");
    let mut repo = HistoryRepository::load(store, STORAGE_KEY);
    assert!(repo.is_empty());
    assert!(repo.hydration().unreadable);

    repo.append("fresh start", None).unwrap();
    let reloaded = HistoryRepository::load(repo.into_store(), STORAGE_KEY);
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.items()[0].entry.response.as_deref(), Some(NO_RESPONSE));
}

#[test]
fn message_without_text_is_ignored() {
    let mut h = Harness::with_entries(&[]);
    h.bus
        .publish(BridgeEvent::NewChatMessage(NewChatMessage::default()));
    h.bus
        .publish(BridgeEvent::NewChatMessage(NewChatMessage::new("", Some("x".into()))));

    assert_eq!(h.sidebar.pump(), 0);
    assert!(h.sidebar.repository().is_empty());
    assert!(h.sidebar.repository().store().get(STORAGE_KEY).is_none());
}

#[test]
fn filter_matches_query_or_response_case_insensitively() {
    let h = Harness::with_entries(&["Tokio runtime", "Serde derive", "tokio select"]);
    let items = h.sidebar.repository().items();

    for q in ["tokio", "RESPONSE", "derive", "nothing here", "SeLeCt"] {
        let filtered = filter_entries(items, q);
        for item in items {
            let needle = q.to_lowercase();
            let expected = item.entry.query.to_lowercase().contains(&needle)
                || item
                    .entry
                    .response
                    .as_deref()
                    .map_or(false, |r| r.to_lowercase().contains(&needle));
            let present = filtered.iter().any(|f| f.id == item.id);
            assert_eq!(present, expected, "query {q:?} entry {:?}", item.entry.query);
        }
    }

    let tokio: Vec<&str> = filter_entries(items, "TOKIO")
        .iter()
        .map(|i| i.entry.query.as_str())
        .collect();
    assert_eq!(tokio, vec!["Tokio runtime", "tokio select"]);

    // Every entry's response ends in "response"
    assert_eq!(filter_entries(items, "RESPONSE").len(), items.len());
    assert!(filter_entries(items, "nothing here").is_empty());
}

#[test]
fn empty_filter_returns_full_list_in_order() {
    let h = Harness::with_entries(&["x", "y", "z"]);
    let items = h.sidebar.repository().items();
    let filtered: Vec<EntryId> = filter_entries(items, "").iter().map(|i| i.id).collect();
    let all: Vec<EntryId> = items.iter().map(|i| i.id).collect();
    assert_eq!(filtered, all);
}

#[test]
fn selecting_emits_load_chat() {
    let mut h = Harness::with_entries(&["a", "b"]);
    let b = h.id_at(1);

    h.sidebar.select(b).unwrap();
    assert_eq!(h.sidebar.selected(), Some(b));
    assert_eq!(
        h.take_loaded(),
        vec![LoadChat {
            message: "b".to_string(),
            response: "b response".to_string(),
        }]
    );
}

#[test]
fn deleting_before_selection_keeps_same_entry() {
    let mut h = Harness::with_entries(&["A", "B", "C"]);
    let a = h.id_at(0);
    let b = h.id_at(1);
    h.sidebar.select(b).unwrap();
    h.take_loaded();

    let outcome = h.sidebar.delete(a).unwrap();

    assert_eq!(outcome, DeleteOutcome::Unchanged);
    assert_eq!(h.queries(), vec!["B", "C"]);
    assert_eq!(h.sidebar.selected(), Some(b));
    assert_eq!(h.sidebar.selected_position(), Some(0));
    assert!(h.take_loaded().is_empty());
}

#[test]
fn deleting_after_selection_leaves_it_alone() {
    let mut h = Harness::with_entries(&["A", "B", "C"]);
    let a = h.id_at(0);
    let c = h.id_at(2);
    h.sidebar.select(a).unwrap();
    h.take_loaded();

    assert_eq!(h.sidebar.delete(c).unwrap(), DeleteOutcome::Unchanged);
    assert_eq!(h.sidebar.selected_position(), Some(0));
    assert!(h.take_loaded().is_empty());
}

#[test]
fn deleting_selected_last_entry_selects_new_last() {
    let mut h = Harness::with_entries(&["A", "B", "C"]);
    let b = h.id_at(1);
    let c = h.id_at(2);
    h.sidebar.select(c).unwrap();
    h.take_loaded();

    let outcome = h.sidebar.delete(c).unwrap();

    assert_eq!(outcome, DeleteOutcome::Reselected(b));
    assert_eq!(h.queries(), vec!["A", "B"]);
    assert_eq!(h.sidebar.selected_position(), Some(1));
    assert_eq!(
        h.take_loaded(),
        vec![LoadChat {
            message: "B".to_string(),
            response: "B response".to_string(),
        }]
    );
}

#[test]
fn deleting_selected_middle_entry_selects_follower() {
    let mut h = Harness::with_entries(&["A", "B", "C"]);
    let b = h.id_at(1);
    let c = h.id_at(2);
    h.sidebar.select(b).unwrap();
    h.take_loaded();

    assert_eq!(h.sidebar.delete(b).unwrap(), DeleteOutcome::Reselected(c));
    assert_eq!(h.sidebar.selected_position(), Some(1));
    assert_eq!(h.take_loaded()[0].message, "C");
}

#[test]
fn deleting_only_entry_resets_instead_of_loading() {
    let mut h = Harness::with_entries(&["solo"]);
    let solo = h.id_at(0);
    h.sidebar.select(solo).unwrap();
    h.sidebar.open_menu(solo);
    h.sidebar.toggle_search();
    h.take_loaded();

    let outcome = h.sidebar.delete(solo).unwrap();

    assert_eq!(outcome, DeleteOutcome::Emptied);
    assert!(h.take_loaded().is_empty());
    assert_eq!(h.sidebar.selected(), None);
    assert_eq!(h.sidebar.menu_open(), None);
    assert!(!h.sidebar.view().is_searching);
    assert_eq!(h.sidebar.repository().store().get(STORAGE_KEY), Some("[]"));
}

#[test]
fn opening_a_menu_closes_the_previous_one() {
    let mut h = Harness::with_entries(&["a", "b", "c"]);
    let first = h.id_at(0);
    let third = h.id_at(2);

    assert!(h.sidebar.open_menu(first));
    assert!(h.sidebar.open_menu(third));
    assert_eq!(h.sidebar.menu_open(), Some(third));

    h.sidebar.toggle_menu(third);
    assert_eq!(h.sidebar.menu_open(), None);
}

#[test]
fn remount_does_not_leak_handlers() {
    let bus = EventBus::new();
    let mut repo = HistoryRepository::load(MemoryStore::new(), STORAGE_KEY);

    for round in 0..3 {
        let sidebar = Sidebar::attach(repo, &bus);
        bus.publish(BridgeEvent::NewChatMessage(NewChatMessage::new(
            format!("round {round}"),
            None,
        )));
        repo = sidebar.detach();
    }

    assert_eq!(repo.len(), 3);
    assert_eq!(
        bus.subscriber_count(chronicle_core::Topic::NewChatMessage),
        0
    );
}
