//! Conversation controller
//!
//! Orchestrates the store against the transport: loading the conversation
//! list, opening a thread (load + read receipt), sending messages with
//! optimistic UI and rollback, and the silent background list refresh.
//!
//! The controller is the sole translator from transport failures into store
//! actions and user-facing notices. The store itself never performs I/O.
//!
//! Async completions can resolve out of call order. Every thread-message load
//! stamps a fresh ticket; a completion whose ticket is no longer current is
//! dropped, so rapid conversation switching can never apply a stale thread's
//! messages over the active one.

use crate::auth::Session;
use crate::config::ClientConfig;
use crate::model::{Conversation, LastMessage, NewMessage};
use crate::screens::MessageDraft;
use crate::store::{Action, MessageStore, MessageStoreState};
use crate::transport::MessageApi;
use crate::{Error, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Signals surfaced to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A blocking notice the user should see
    Alert {
        /// Short title
        title: String,
        /// Message body
        body: String,
    },
    /// The thread for this user should be presented
    OpenThread {
        /// Id of the other participant
        other_user_id: i64,
    },
}

/// Callback type for receiving [`Notice`] signals
pub type NoticeHandler = Arc<dyn Fn(Notice) + Send + Sync>;

/// Outcome of a send attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank text or no selected conversation; nothing was sent
    Skipped,
    /// The backend accepted the message
    Sent(crate::model::Message),
    /// The send failed; the caller should restore this text into the input
    Rejected {
        /// The original text, for restoring the input field
        restore_text: String,
    },
}

/// Orchestrates conversations and messages against the backend
///
/// Cheap to clone; clones share the same store, session and handlers.
#[derive(Clone)]
pub struct ConversationController {
    api: Arc<dyn MessageApi>,
    session: Arc<Session>,
    store: MessageStore,
    notice_handler: Arc<Mutex<Option<NoticeHandler>>>,
    load_ticket: Arc<std::sync::Mutex<Option<Uuid>>>,
    quiet_refresh_delay: Duration,
}

impl ConversationController {
    /// Create a controller with default configuration
    pub fn new(api: Arc<dyn MessageApi>, session: Arc<Session>) -> Self {
        Self::with_config(api, session, &ClientConfig::default())
    }

    /// Create a controller with explicit configuration
    pub fn with_config(
        api: Arc<dyn MessageApi>,
        session: Arc<Session>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            api,
            session,
            store: MessageStore::new(),
            notice_handler: Arc::new(Mutex::new(None)),
            load_ticket: Arc::new(std::sync::Mutex::new(None)),
            quiet_refresh_delay: Duration::from_millis(config.quiet_refresh_delay_ms),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Subscribe to state snapshots
    pub fn subscribe(&self) -> watch::Receiver<MessageStoreState> {
        self.store.subscribe()
    }

    /// Set the notice handler callback
    ///
    /// The handler receives alerts and navigation signals; any presentation
    /// layer can register one.
    pub async fn set_notice_handler<F>(&self, handler: F)
    where
        F: Fn(Notice) + Send + Sync + 'static,
    {
        let mut guard = self.notice_handler.lock().await;
        *guard = Some(Arc::new(handler));
    }

    async fn notify(&self, notice: Notice) {
        let handler = self.notice_handler.lock().await.clone();
        if let Some(handler) = handler {
            handler(notice);
        }
    }

    /// Load the conversation list
    ///
    /// Safe to call repeatedly: each success replaces the list wholesale.
    pub async fn load_conversations(&self) -> Result<()> {
        self.store.dispatch(Action::BeginLoadConversations);

        match self.api.get_conversations().await {
            Ok(conversations) => {
                info!("Loaded {} conversations", conversations.len());
                self.store.dispatch(Action::ConversationsLoaded(conversations));
            }
            Err(e) => {
                warn!("Failed to load conversations: {}", e);
                self.store.dispatch(Action::Failed(e.to_string()));
                self.notify(Notice::Alert {
                    title: "Conversaciones".to_string(),
                    body: "No se pudieron cargar las conversaciones.".to_string(),
                })
                .await;
            }
        }
        Ok(())
    }

    /// Open a conversation's thread
    ///
    /// The selection update and the open-thread signal are observable before
    /// the message load completes, so the UI can show a loading state for the
    /// correct thread. A silent conversation-list refresh is scheduled after
    /// a fixed delay; its failures are swallowed.
    pub async fn open_conversation(&self, conversation: Conversation) -> Result<()> {
        let other_user_id = conversation.other_user.id;

        self.store
            .dispatch(Action::SelectConversation(Some(conversation)));
        self.notify(Notice::OpenThread { other_user_id }).await;

        let controller = self.clone();
        let delay = self.quiet_refresh_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.update_conversations_quietly().await;
        });

        self.load_messages(other_user_id).await
    }

    /// Load the messages exchanged with `other_user_id`
    ///
    /// On success the thread is replaced and a best-effort read receipt is
    /// issued for the other user's messages; a receipt failure is logged and
    /// swallowed. On fetch failure the error is surfaced through the store
    /// and an alert.
    pub async fn load_messages(&self, other_user_id: i64) -> Result<()> {
        self.load_messages_inner(other_user_id, false).await
    }

    async fn load_messages_inner(&self, other_user_id: i64, silent: bool) -> Result<()> {
        let me = self
            .session
            .current_user()
            .await
            .ok_or_else(|| Error::Auth("no signed-in user".to_string()))?;

        let ticket = Uuid::new_v4();
        *self.load_ticket.lock().expect("ticket mutex poisoned") = Some(ticket);

        self.store.dispatch(Action::BeginLoadMessages);

        match self.api.get_messages_between(me.id, other_user_id).await {
            Ok(messages) => {
                if !self.ticket_is_current(ticket) {
                    debug!(
                        "Dropping stale message load for user {} ({} messages)",
                        other_user_id,
                        messages.len()
                    );
                    return Ok(());
                }

                info!("Loaded {} messages with user {}", messages.len(), other_user_id);
                self.store.dispatch(Action::MessagesLoaded(messages));

                match self.api.mark_messages_as_read(other_user_id, me.id).await {
                    Ok(receipt) => {
                        debug!(
                            "Marked {} messages from user {} as read",
                            receipt.marked_count, other_user_id
                        );
                        self.store.dispatch(Action::MarkRead {
                            sender_id: other_user_id,
                        });
                    }
                    Err(e) => {
                        warn!("Failed to mark messages from {} as read: {}", other_user_id, e);
                    }
                }
            }
            Err(e) => {
                if !self.ticket_is_current(ticket) {
                    debug!("Dropping stale message-load failure for user {}", other_user_id);
                    return Ok(());
                }

                warn!("Failed to load messages with user {}: {}", other_user_id, e);
                self.store.dispatch(Action::Failed(e.to_string()));
                if !silent {
                    self.notify(Notice::Alert {
                        title: "Mensajes".to_string(),
                        body: "No se pudieron cargar los mensajes.".to_string(),
                    })
                    .await;
                }
            }
        }
        Ok(())
    }

    fn ticket_is_current(&self, ticket: Uuid) -> bool {
        *self.load_ticket.lock().expect("ticket mutex poisoned") == Some(ticket)
    }

    /// Send a message to the selected conversation
    ///
    /// No-op when the text trims to empty or no conversation is selected.
    /// On success the returned message is appended and the conversation's
    /// preview is patched client-side with a locally stamped timestamp (the
    /// next list refresh reconciles it). On failure nothing is appended and
    /// the original text is handed back for restoring the input.
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome> {
        let content = text.trim();
        let Some(conversation) = self.store.snapshot().selected else {
            return Ok(SendOutcome::Skipped);
        };
        if content.is_empty() {
            return Ok(SendOutcome::Skipped);
        }

        let other_user_id = conversation.other_user.id;
        self.store.dispatch(Action::BeginSend);

        let payload = NewMessage {
            content: content.to_string(),
            receiver_id: other_user_id,
        };

        let outcome = match self.api.send_message(&payload).await {
            Ok(message) => {
                info!("Sent message {} to user {}", message.id, other_user_id);
                self.store.dispatch(Action::MessageAppended(message.clone()));
                self.store.dispatch(Action::ConversationPreviewUpdated {
                    other_user_id,
                    last_message: LastMessage {
                        content: message.content.clone(),
                        sent_at: Utc::now(),
                        sender_id: message.sender_id,
                    },
                });
                SendOutcome::Sent(message)
            }
            Err(e) => {
                warn!("Failed to send message to user {}: {}", other_user_id, e);
                self.store.dispatch(Action::Failed(e.to_string()));
                self.notify(Notice::Alert {
                    title: "Mensaje".to_string(),
                    body: "No se pudo enviar el mensaje. Inténtalo de nuevo.".to_string(),
                })
                .await;
                SendOutcome::Rejected {
                    restore_text: text.to_string(),
                }
            }
        };

        self.store.dispatch(Action::EndSend);
        Ok(outcome)
    }

    /// Send the draft's text, clearing the input before the network call
    ///
    /// The optimistic-UI protocol: the input is drained immediately; if the
    /// backend rejects the send, the original text is restored exactly once.
    pub async fn send_draft(&self, draft: &mut MessageDraft) -> Result<SendOutcome> {
        let text = draft.take();
        let outcome = self.send_message(&text).await?;
        if let SendOutcome::Rejected { restore_text } = &outcome {
            draft.restore(restore_text.clone());
        }
        Ok(outcome)
    }

    /// Reload the selected thread behind the refreshing flag
    ///
    /// No-op without a selection. Failures are logged, never alerted.
    pub async fn refresh_messages(&self) -> Result<()> {
        let Some(conversation) = self.store.snapshot().selected else {
            return Ok(());
        };

        self.store.dispatch(Action::BeginRefresh);
        let result = self
            .load_messages_inner(conversation.other_user.id, true)
            .await;
        self.store.dispatch(Action::EndRefresh);

        if let Err(e) = result {
            warn!("Failed to refresh messages: {}", e);
        }
        Ok(())
    }

    /// Silently refresh the conversation list
    ///
    /// Replaces the list without touching the loading or error state;
    /// failures are logged and swallowed.
    pub async fn update_conversations_quietly(&self) {
        match self.api.get_conversations().await {
            Ok(conversations) => {
                debug!("Quiet refresh: {} conversations", conversations.len());
                self.store
                    .dispatch(Action::ConversationsRefreshed(conversations));
            }
            Err(e) => {
                debug!("Quiet refresh failed: {}", e);
            }
        }
    }
}
