use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chronicle_core::{
    BridgeEvent, CoreConfig, DeleteOutcome, EntryId, EventBus, FileStore, HistoryRepository,
    LoadChat, NewChatMessage, Sidebar, Subscription,
};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    List { search: Option<String> },
    Add { message: String, response: Option<String> },
    Ingest,
    Show { position: usize },
    Delete { position: usize, selected: Option<usize> },
}

/// A mounted sidebar plus a stand-in for the conversation view that records
/// every `loadChat` it is sent.
pub struct Session {
    bus: EventBus,
    sidebar: Sidebar<FileStore>,
    loaded: Arc<Mutex<Vec<LoadChat>>>,
    _view: Subscription,
}

impl Session {
    pub fn open(config: &CoreConfig, bus: &EventBus) -> Self {
        let loaded = Arc::new(Mutex::new(Vec::new()));
        let sink = loaded.clone();
        let view = bus.on_load_chat(move |payload| sink.lock().push(payload.clone()));

        let repo = HistoryRepository::load(config.file_store(), config.storage_key.as_str());
        let sidebar = Sidebar::attach(repo, bus);

        Self {
            bus: bus.clone(),
            sidebar,
            loaded,
            _view: view,
        }
    }

    pub fn sidebar(&self) -> &Sidebar<FileStore> {
        &self.sidebar
    }

    fn take_loaded(&self) -> Vec<LoadChat> {
        std::mem::take(&mut *self.loaded.lock())
    }

    /// Map a 1-based list position to an entry.
    fn id_for(&self, position: usize) -> Result<EntryId> {
        let len = self.sidebar.repository().len();
        match position.checked_sub(1).and_then(|p| self.sidebar.repository().item_at(p)) {
            Some(item) => Ok(item.id),
            None => bail!("no entry #{position} (history has {len} entries)"),
        }
    }
}

/// Run one command against the history in `config`.
pub fn execute<R: BufRead, W: Write>(
    command: CliCommand,
    config: &CoreConfig,
    bus: &EventBus,
    input: R,
    out: &mut W,
) -> Result<()> {
    let mut session = Session::open(config, bus);

    match command {
        CliCommand::List { search } => list(&mut session, search, out)?,
        CliCommand::Add { message, response } => {
            session
                .bus
                .publish(BridgeEvent::NewChatMessage(NewChatMessage::new(message, response)));
            if session.sidebar.pump() == 0 {
                bail!("message was not recorded");
            }
            writeln!(out, "Recorded #{}", session.sidebar.repository().len())?;
        }
        CliCommand::Ingest => ingest(&mut session, input, out)?,
        CliCommand::Show { position } => {
            let id = session.id_for(position)?;
            session.sidebar.select(id)?;
            print_loaded(&session, out)?;
        }
        CliCommand::Delete { position, selected } => {
            if let Some(selected) = selected {
                let id = session.id_for(selected)?;
                session.sidebar.select(id)?;
                // The conversation view already shows it
                session.take_loaded();
            }

            let id = session.id_for(position)?;
            match session.sidebar.delete(id)? {
                DeleteOutcome::Emptied => {
                    writeln!(out, "Deleted #{position}; history is now empty")?;
                }
                DeleteOutcome::Reselected(_) => {
                    writeln!(out, "Deleted #{position}")?;
                    print_loaded(&session, out)?;
                }
                DeleteOutcome::Unchanged => writeln!(out, "Deleted #{position}")?,
            }
        }
    }

    session.sidebar.detach();
    Ok(())
}

fn list<W: Write>(session: &mut Session, search: Option<String>, out: &mut W) -> Result<()> {
    if let Some(query) = search {
        session.sidebar.toggle_search();
        session.sidebar.set_search_query(query);
    }

    let repo = session.sidebar.repository();
    let visible = session.sidebar.visible_entries();
    if visible.is_empty() {
        writeln!(out, "No chat history")?;
        return Ok(());
    }

    for item in visible {
        // Positions always refer to the full list so they can be fed to show/delete
        let position = repo.position(item.id).map_or(0, |p| p + 1);
        writeln!(
            out,
            "{position:>3}. {}  [{}]",
            item.entry.query,
            item.entry.time_label()
        )?;
    }
    Ok(())
}

/// Read bridge events, one JSON object per line, and apply the inbound ones.
fn ingest<R: BufRead, W: Write>(session: &mut Session, input: R, out: &mut W) -> Result<()> {
    let mut skipped = 0usize;

    for (line_no, line) in input.lines().enumerate() {
        let line = line.context("failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<BridgeEvent>(&line) {
            Ok(event @ BridgeEvent::NewChatMessage(_)) => {
                session.bus.publish(event);
            }
            Ok(BridgeEvent::LoadChat(_)) => {
                tracing::warn!(line = line_no + 1, "loadChat is outbound only, skipping");
                skipped += 1;
            }
            Err(e) => {
                tracing::warn!(line = line_no + 1, error = %e, "unparseable bridge event");
                skipped += 1;
            }
        }
    }

    let recorded = session.sidebar.pump();
    writeln!(out, "Ingested {recorded} entries ({skipped} skipped)")?;
    Ok(())
}

fn print_loaded<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    for payload in session.take_loaded() {
        writeln!(out, "{}", serde_json::to_string(&BridgeEvent::LoadChat(payload))?)?;
    }
    Ok(())
}
