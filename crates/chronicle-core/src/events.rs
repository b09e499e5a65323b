//! Event bridge between the history sidebar and the conversation view.
//!
//! A process-wide observer registry with two named topics. Delivery is
//! fire-and-forget: publishing never fails and nobody acknowledges.
//! Handlers run synchronously on the publishing thread, in subscription order.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants::{TOPIC_LOAD_CHAT, TOPIC_NEW_CHAT_MESSAGE};
use crate::models::ChatEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    NewChatMessage,
    LoadChat,
}

impl Topic {
    pub fn name(&self) -> &'static str {
        match self {
            Topic::NewChatMessage => TOPIC_NEW_CHAT_MESSAGE,
            Topic::LoadChat => TOPIC_LOAD_CHAT,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            TOPIC_NEW_CHAT_MESSAGE => Some(Topic::NewChatMessage),
            TOPIC_LOAD_CHAT => Some(Topic::LoadChat),
            _ => None,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inbound: a conversation turn finished and should be recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl NewChatMessage {
    pub fn new(message: impl Into<String>, response: Option<String>) -> Self {
        Self {
            message: Some(message.into()),
            response,
        }
    }

    /// The message text, if it is present and non-empty.
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

/// Outbound: show this entry as the active conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadChat {
    pub message: String,
    pub response: String,
}

impl LoadChat {
    pub fn from_entry(entry: &ChatEntry) -> Self {
        Self {
            message: entry.query.clone(),
            response: entry.response_or_default().to_string(),
        }
    }
}

/// A signal on the bridge. Serialized as `{"type": <topic>, "detail": <payload>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum BridgeEvent {
    #[serde(rename = "newChatMessage")]
    NewChatMessage(NewChatMessage),
    #[serde(rename = "loadChat")]
    LoadChat(LoadChat),
}

impl BridgeEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BridgeEvent::NewChatMessage(_) => Topic::NewChatMessage,
            BridgeEvent::LoadChat(_) => Topic::LoadChat,
        }
    }
}

type Handler = Arc<dyn Fn(&BridgeEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, Topic, Handler)>,
}

/// Publish/subscribe channel with named topics and any number of subscribers.
///
/// Cloning yields another handle to the same registry. [`EventBus::global`]
/// is the process-wide instance; separate buses can be created for isolation.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide bus.
    pub fn global() -> &'static EventBus {
        static GLOBAL: OnceLock<EventBus> = OnceLock::new();
        GLOBAL.get_or_init(EventBus::new)
    }

    /// Register a handler for `topic`. The handler stays registered until the
    /// returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: Fn(&BridgeEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, topic, Arc::new(handler)));
        tracing::trace!(%topic, id, "bridge subscribe");

        Subscription {
            id,
            topic,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Subscribe to `newChatMessage` with a typed handler.
    pub fn on_new_chat_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&NewChatMessage) + Send + Sync + 'static,
    {
        self.subscribe(Topic::NewChatMessage, move |event| {
            if let BridgeEvent::NewChatMessage(payload) = event {
                handler(payload);
            }
        })
    }

    /// Subscribe to `loadChat` with a typed handler.
    pub fn on_load_chat<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&LoadChat) + Send + Sync + 'static,
    {
        self.subscribe(Topic::LoadChat, move |event| {
            if let BridgeEvent::LoadChat(payload) = event {
                handler(payload);
            }
        })
    }

    /// Deliver `event` to every current subscriber of its topic.
    /// Returns how many handlers were invoked.
    ///
    /// The registry lock is released before handlers run, so a handler may
    /// publish or (un)subscribe without deadlocking.
    pub fn publish(&self, event: BridgeEvent) -> usize {
        let topic = event.topic();
        let handlers: Vec<Handler> = self
            .registry
            .lock()
            .handlers
            .iter()
            .filter(|(_, t, _)| *t == topic)
            .map(|(_, _, handler)| Arc::clone(handler))
            .collect();

        tracing::trace!(%topic, subscribers = handlers.len(), "bridge publish");
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.registry
            .lock()
            .handlers
            .iter()
            .filter(|(_, t, _)| *t == topic)
            .count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("new_chat_message", &self.subscriber_count(Topic::NewChatMessage))
            .field("load_chat", &self.subscriber_count(Topic::LoadChat))
            .finish()
    }
}

/// Guard for a registered handler. Dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes the handler"]
pub struct Subscription {
    id: u64,
    topic: Topic,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Explicit teardown; equivalent to dropping the guard.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().handlers.retain(|(id, _, _)| *id != self.id);
            tracing::trace!(topic = %self.topic, id = self.id, "bridge unsubscribe");
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish()
    }
}
