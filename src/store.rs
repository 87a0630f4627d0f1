//! Conversation/message store
//!
//! A reducer-style state machine over a single mutable aggregate:
//! - [`MessageStoreState`] — conversations, the selected thread, its
//!   messages, four independent busy flags, and an optional error
//! - [`Action`] — tagged transitions applied through the pure [`reduce`]
//!   function (no I/O, never suspends)
//! - [`MessageStore`] — the owning wrapper that serializes dispatches and
//!   publishes a snapshot to subscribers after every transition
//!
//! The four busy flags are intentionally independent booleans rather than one
//! discrete enum: loading the conversation list and loading a thread are
//! separate concerns and must not clobber each other's visual state.

use crate::model::{Conversation, LastMessage, Message};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Snapshot of the messaging state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageStoreState {
    /// Conversation list, in backend order; replaced atomically per fetch
    pub conversations: Vec<Conversation>,
    /// The conversation whose thread is open, if any
    pub selected: Option<Conversation>,
    /// Messages of the selected thread, chronological
    pub messages: Vec<Message>,
    /// Conversation list fetch in flight
    pub loading: bool,
    /// Thread message fetch in flight
    pub loading_messages: bool,
    /// Message send in flight
    pub sending: bool,
    /// Pull-to-refresh in flight
    pub refreshing: bool,
    /// Last failure description, cleared by the next successful operation
    pub error: Option<String>,
}

/// State transitions
#[derive(Debug, Clone)]
pub enum Action {
    /// Conversation-list fetch started
    BeginLoadConversations,
    /// Conversation-list fetch succeeded
    ConversationsLoaded(Vec<Conversation>),
    /// Silent conversation-list refresh succeeded; replaces the list without
    /// touching `loading` or `error`
    ConversationsRefreshed(Vec<Conversation>),
    /// Thread selection changed
    SelectConversation(Option<Conversation>),
    /// Thread message fetch started
    BeginLoadMessages,
    /// Thread message fetch succeeded
    MessagesLoaded(Vec<Message>),
    /// A message was appended to the open thread
    MessageAppended(Message),
    /// The matching conversation's preview is patched after a successful send
    ConversationPreviewUpdated {
        /// Id of the other participant in the patched conversation
        other_user_id: i64,
        /// New last-message snapshot
        last_message: LastMessage,
    },
    /// Message send started
    BeginSend,
    /// Message send finished, either way
    EndSend,
    /// Pull-to-refresh started
    BeginRefresh,
    /// Pull-to-refresh finished
    EndRefresh,
    /// An operation failed; clears every busy flag
    Failed(String),
    /// All messages from `sender_id` were acknowledged read
    MarkRead {
        /// Id of the sender whose messages are now read
        sender_id: i64,
    },
}

/// Apply a single action to the state
///
/// Pure transition function: no I/O, no suspension, total over all
/// action/state combinations.
pub fn reduce(state: &mut MessageStoreState, action: Action) {
    match action {
        Action::BeginLoadConversations => {
            state.loading = true;
        }
        Action::ConversationsLoaded(conversations) => {
            state.conversations = conversations;
            state.loading = false;
            state.error = None;
        }
        Action::ConversationsRefreshed(conversations) => {
            state.conversations = conversations;
        }
        Action::SelectConversation(conversation) => {
            state.selected = conversation;
        }
        Action::BeginLoadMessages => {
            state.loading_messages = true;
            state.error = None;
        }
        Action::MessagesLoaded(messages) => {
            state.messages = messages;
            state.loading_messages = false;
            state.error = None;
        }
        Action::MessageAppended(message) => {
            state.messages.push(message);
        }
        Action::ConversationPreviewUpdated {
            other_user_id,
            last_message,
        } => {
            for conversation in state
                .conversations
                .iter_mut()
                .chain(state.selected.iter_mut())
            {
                if conversation.other_user.id == other_user_id {
                    conversation.last_message = last_message.clone();
                    conversation.last_message_time = last_message.sent_at;
                    conversation.message_count += 1;
                }
            }
        }
        Action::BeginSend => {
            state.sending = true;
        }
        Action::EndSend => {
            state.sending = false;
        }
        Action::BeginRefresh => {
            state.refreshing = true;
        }
        Action::EndRefresh => {
            state.refreshing = false;
        }
        Action::Failed(error) => {
            // A failure in one subsystem must never strand an unrelated flag busy
            state.error = Some(error);
            state.loading = false;
            state.loading_messages = false;
            state.sending = false;
        }
        Action::MarkRead { sender_id } => {
            for message in &mut state.messages {
                if message.sender_id == sender_id {
                    message.is_read = true;
                }
            }
            for conversation in state
                .conversations
                .iter_mut()
                .chain(state.selected.iter_mut())
            {
                if conversation.other_user.id == sender_id {
                    conversation.unread_count = 0;
                }
            }
        }
    }
}

/// Observable store owning a [`MessageStoreState`]
///
/// Dispatch is the only mutation entry point; every dispatch publishes the
/// new snapshot to all subscribers. Clones share the same state.
#[derive(Debug, Clone)]
pub struct MessageStore {
    state: Arc<Mutex<MessageStoreState>>,
    tx: watch::Sender<MessageStoreState>,
}

impl MessageStore {
    /// Create an empty store
    pub fn new() -> Self {
        let state = MessageStoreState::default();
        let (tx, _rx) = watch::channel(state.clone());
        Self {
            state: Arc::new(Mutex::new(state)),
            tx,
        }
    }

    /// Apply an action and publish the resulting snapshot
    pub fn dispatch(&self, action: Action) {
        let snapshot = {
            let mut guard = self.state.lock().expect("store mutex poisoned");
            reduce(&mut guard, action);
            guard.clone()
        };
        // Subscribers may all be gone; dispatch still has to mutate state
        let _ = self.tx.send(snapshot);
    }

    /// Current state snapshot
    pub fn snapshot(&self) -> MessageStoreState {
        self.state.lock().expect("store mutex poisoned").clone()
    }

    /// Subscribe to state snapshots
    pub fn subscribe(&self) -> watch::Receiver<MessageStoreState> {
        self.tx.subscribe()
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserSummary;
    use chrono::{TimeZone, Utc};

    fn create_test_user(id: i64, name: &str) -> UserSummary {
        UserSummary {
            id,
            name: name.to_string(),
            lastname: "Prueba".to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            city: None,
            department: None,
        }
    }

    fn create_test_conversation(other_user_id: i64, unread: u32) -> Conversation {
        let sent_at = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        Conversation {
            other_user: create_test_user(other_user_id, "Ana"),
            last_message: LastMessage {
                content: "Hola".to_string(),
                sent_at,
                sender_id: other_user_id,
            },
            unread_count: unread,
            message_count: 5,
            last_message_time: sent_at,
        }
    }

    fn create_test_message(id: i64, sender_id: i64, content: &str) -> Message {
        Message {
            id,
            content: content.to_string(),
            sender_id,
            receiver_id: 1,
            sent_at: Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap(),
            is_read: false,
            is_delivered: true,
        }
    }

    #[test]
    fn test_load_conversations_cycle() {
        let mut state = MessageStoreState::default();

        reduce(&mut state, Action::BeginLoadConversations);
        assert!(state.loading);

        reduce(
            &mut state,
            Action::ConversationsLoaded(vec![create_test_conversation(9, 2)]),
        );
        assert!(!state.loading);
        assert_eq!(state.conversations.len(), 1);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_loaded_replaces_instead_of_accumulating() {
        let mut state = MessageStoreState::default();

        reduce(
            &mut state,
            Action::ConversationsLoaded(vec![
                create_test_conversation(9, 2),
                create_test_conversation(10, 0),
            ]),
        );
        reduce(
            &mut state,
            Action::ConversationsLoaded(vec![create_test_conversation(9, 0)]),
        );
        assert_eq!(state.conversations.len(), 1);
    }

    #[test]
    fn test_refreshed_does_not_touch_loading_or_error() {
        let mut state = MessageStoreState::default();
        state.loading = true;
        state.error = Some("previous failure".to_string());

        reduce(
            &mut state,
            Action::ConversationsRefreshed(vec![create_test_conversation(9, 1)]),
        );

        assert_eq!(state.conversations.len(), 1);
        assert!(state.loading, "silent refresh must not clear loading");
        assert_eq!(state.error.as_deref(), Some("previous failure"));
    }

    #[test]
    fn test_failed_clears_all_busy_flags() {
        // From any combination of prior flags, Failed leaves none stuck busy
        for bits in 0..8u8 {
            let mut state = MessageStoreState {
                loading: bits & 1 != 0,
                loading_messages: bits & 2 != 0,
                sending: bits & 4 != 0,
                ..MessageStoreState::default()
            };

            reduce(&mut state, Action::Failed("boom".to_string()));

            assert!(!state.loading);
            assert!(!state.loading_messages);
            assert!(!state.sending);
            assert_eq!(state.error.as_deref(), Some("boom"));
        }
    }

    #[test]
    fn test_begin_load_messages_clears_prior_error() {
        let mut state = MessageStoreState::default();
        reduce(&mut state, Action::Failed("boom".to_string()));

        reduce(&mut state, Action::BeginLoadMessages);
        assert!(state.loading_messages);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let mut state = MessageStoreState::default();
        state.conversations = vec![create_test_conversation(9, 3)];
        state.selected = Some(create_test_conversation(9, 3));
        state.messages = vec![
            create_test_message(1, 9, "Hola"),
            create_test_message(2, 1, "Buenas"),
            create_test_message(3, 9, "¿Cómo va?"),
        ];

        reduce(&mut state, Action::MarkRead { sender_id: 9 });
        let once = state.clone();
        reduce(&mut state, Action::MarkRead { sender_id: 9 });

        assert_eq!(state, once, "second MarkRead must not change the state");
        assert!(state.messages[0].is_read);
        assert!(!state.messages[1].is_read, "own messages stay untouched");
        assert!(state.messages[2].is_read);
        assert_eq!(state.conversations[0].unread_count, 0);
        assert_eq!(
            state.selected.as_ref().expect("selection lost").unread_count,
            0
        );
    }

    #[test]
    fn test_preview_patch_updates_matching_conversation() {
        let mut state = MessageStoreState::default();
        state.conversations = vec![
            create_test_conversation(9, 0),
            create_test_conversation(10, 0),
        ];
        state.selected = Some(create_test_conversation(9, 0));

        let sent_at = Utc.with_ymd_and_hms(2025, 5, 2, 8, 30, 0).unwrap();
        reduce(
            &mut state,
            Action::ConversationPreviewUpdated {
                other_user_id: 9,
                last_message: LastMessage {
                    content: "Nos vemos mañana".to_string(),
                    sent_at,
                    sender_id: 1,
                },
            },
        );

        assert_eq!(state.conversations[0].message_count, 6);
        assert_eq!(state.conversations[0].last_message.content, "Nos vemos mañana");
        assert_eq!(state.conversations[0].last_message_time, sent_at);
        // Non-matching conversation untouched
        assert_eq!(state.conversations[1].message_count, 5);
        // Selected copy patched too
        assert_eq!(
            state.selected.as_ref().expect("selection lost").message_count,
            6
        );
    }

    #[test]
    fn test_send_and_refresh_flags() {
        let mut state = MessageStoreState::default();

        reduce(&mut state, Action::BeginSend);
        assert!(state.sending);
        reduce(&mut state, Action::EndSend);
        assert!(!state.sending);

        reduce(&mut state, Action::BeginRefresh);
        assert!(state.refreshing);
        reduce(&mut state, Action::EndRefresh);
        assert!(!state.refreshing);
    }

    #[test]
    fn test_store_publishes_snapshots() {
        let store = MessageStore::new();
        let rx = store.subscribe();

        store.dispatch(Action::BeginLoadConversations);
        assert!(rx.borrow().loading);
        assert!(store.snapshot().loading);

        store.dispatch(Action::ConversationsLoaded(Vec::new()));
        assert!(!rx.borrow().loading);
    }

    #[test]
    fn test_message_appended_preserves_order() {
        let mut state = MessageStoreState::default();
        reduce(
            &mut state,
            Action::MessagesLoaded(vec![create_test_message(1, 9, "Hola")]),
        );
        reduce(
            &mut state,
            Action::MessageAppended(create_test_message(2, 1, "Buenas")),
        );

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].id, 2);
        assert!(!state.loading_messages);
    }
}
