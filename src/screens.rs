//! Screen state structures
//!
//! State and logic for the messaging screens, kept free of any rendering
//! concern so every frontend can drive them:
//! - [`MessageDraft`] — the chat thread's input buffer, with the take/restore
//!   protocol the optimistic send relies on
//! - [`ComposeScreen`] — the "new message" screen: template suggestions,
//!   validation, payload construction, and submit-failure classification

use crate::auth::{AuthUser, Session};
use crate::model::{NewNotification, Notification};
use crate::templates::{render, RecipientProfile, SenderContext, TemplateCategory};
use crate::transport::{ApiError, MessageApi};
use tracing::{info, warn};

/// Backend notification event discriminators, exactly as the backend expects
/// them (case-sensitive)
pub const ALLOWED_EVENTS: &[&str] = &["NEW_MESSAGE", "INTERVIEW_REQUEST", "JOB_OFFER"];

/// Map a UI suggestion category key to its backend event
///
/// Total: unknown keys fall back to `NEW_MESSAGE`.
pub fn notification_event(category_key: &str) -> &'static str {
    match TemplateCategory::from_key(category_key) {
        Some(TemplateCategory::InterviewRequest) => "INTERVIEW_REQUEST",
        Some(TemplateCategory::JobOffer) => "JOB_OFFER",
        Some(_) | None => "NEW_MESSAGE",
    }
}

/// Input buffer for message composition in a thread
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageDraft {
    input: String,
}

impl MessageDraft {
    /// Create an empty draft
    pub fn new() -> Self {
        Self::default()
    }

    /// Add character to input
    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    /// Remove last character from input
    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Clear the input buffer
    pub fn clear(&mut self) {
        self.input.clear();
    }

    /// Drain the input, leaving it empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    /// Put text back into the input (rollback after a failed send)
    pub fn restore(&mut self, text: String) {
        self.input = text;
    }

    /// Current input text
    pub fn text(&self) -> &str {
        &self.input
    }

    /// Whether the input trims to empty
    pub fn is_blank(&self) -> bool {
        self.input.trim().is_empty()
    }
}

/// Validation failure, caught before any network call
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Title input is empty
    #[error("El título es obligatorio")]
    EmptyTitle,
    /// Message input is empty
    #[error("El mensaje es obligatorio")]
    EmptyMessage,
    /// No recipient was chosen
    #[error("Falta el destinatario")]
    MissingRecipient,
    /// No user is signed in
    #[error("Debes iniciar sesión para enviar mensajes")]
    NotAuthenticated,
    /// The event string is not one the backend accepts
    #[error("La categoría del mensaje no es válida")]
    InvalidEvent,
}

/// Classified submit failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    /// Rejected before any network call
    #[error("{0}")]
    Validation(#[from] ValidationError),
    /// The backend rejected the payload (HTTP 400)
    #[error("Datos inválidos: {0}")]
    InvalidData(String),
    /// The token is no longer valid (HTTP 401); the session has been torn down
    #[error("Tu sesión ha expirado. Inicia sesión de nuevo.")]
    SessionExpired,
    /// The backend failed (HTTP 5xx)
    #[error("Error del servidor. Inténtalo más tarde.")]
    ServerError,
    /// The request never reached the backend
    #[error("Sin conexión. Revisa tu internet e inténtalo de nuevo.")]
    Offline,
    /// Anything else; retrying may help
    #[error("No se pudo enviar la notificación. Inténtalo de nuevo.")]
    Unknown(String),
}

/// Classify a transport error into a user-facing submit failure
fn classify(error: ApiError) -> SubmitError {
    match error {
        ApiError::Network(_) => SubmitError::Offline,
        ApiError::Http {
            status: 400,
            message,
        } => {
            if message.contains("evento") || message.contains("event") {
                SubmitError::InvalidData("La categoría del mensaje no es válida.".to_string())
            } else if message.contains("destinatario") || message.contains("recipient") {
                SubmitError::InvalidData("El destinatario no existe.".to_string())
            } else {
                SubmitError::InvalidData(message)
            }
        }
        ApiError::Http { status: 401, .. } => SubmitError::SessionExpired,
        ApiError::Http { status, .. } if status >= 500 => SubmitError::ServerError,
        ApiError::Http { message, .. } => SubmitError::Unknown(message),
        ApiError::Decode(message) => SubmitError::Unknown(message),
    }
}

/// Compose ("new message") screen state
#[derive(Debug, Clone)]
pub struct ComposeScreen {
    /// Notification title input
    pub title: String,
    /// Message body input
    pub message: String,
    /// Chosen recipient, if any
    pub recipient_id: Option<i64>,
    /// Backend event for the submission
    pub event: String,
    /// Status message (for user feedback)
    pub status_message: Option<String>,
    /// Whether the status is an error
    pub is_error: bool,
}

impl ComposeScreen {
    /// Create a compose screen addressed to a recipient
    pub fn new(recipient_id: Option<i64>) -> Self {
        Self {
            title: String::new(),
            message: String::new(),
            recipient_id,
            event: "NEW_MESSAGE".to_string(),
            status_message: None,
            is_error: false,
        }
    }

    /// List the rendered template suggestions for a recipient
    ///
    /// One entry per category, in display order.
    pub fn suggestions(
        profile: &RecipientProfile,
        sender: &SenderContext,
    ) -> Vec<(TemplateCategory, String)> {
        TemplateCategory::ALL
            .into_iter()
            .map(|category| (category, render(category, profile, sender)))
            .collect()
    }

    /// Apply a template suggestion: pre-fill the message and set the event
    pub fn select_suggestion(
        &mut self,
        category: TemplateCategory,
        profile: &RecipientProfile,
        sender: &SenderContext,
    ) {
        self.message = render(category, profile, sender);
        self.event = notification_event(category.key()).to_string();
    }

    /// Validate the form and build the outgoing payload
    ///
    /// # Errors
    /// Returns the first failing check; nothing reaches the network until
    /// validation passes
    pub fn validate(&self, sender: Option<&AuthUser>) -> Result<NewNotification, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.message.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        let recipient_id = self.recipient_id.ok_or(ValidationError::MissingRecipient)?;
        let sender = sender.ok_or(ValidationError::NotAuthenticated)?;
        if !ALLOWED_EVENTS.contains(&self.event.as_str()) {
            return Err(ValidationError::InvalidEvent);
        }

        Ok(NewNotification {
            title: self.title.trim().to_string(),
            message: self.message.trim().to_string(),
            sender_id: sender.id,
            recipient_id,
            event: self.event.clone(),
        })
    }

    /// Validate and submit the notification
    ///
    /// Failures are classified for the user (invalid data, expired session,
    /// server error, offline). An expired session is torn down here; the
    /// resulting navigation is the caller's concern.
    pub async fn submit(
        &mut self,
        api: &dyn MessageApi,
        session: &Session,
    ) -> Result<Notification, SubmitError> {
        let user = session.current_user().await;
        let payload = match self.validate(user.as_ref()) {
            Ok(payload) => payload,
            Err(e) => {
                self.status_message = Some(e.to_string());
                self.is_error = true;
                return Err(e.into());
            }
        };

        match api.create_notification(&payload).await {
            Ok(notification) => {
                info!(
                    "Notification {} sent to user {}",
                    notification.id, payload.recipient_id
                );
                self.status_message = Some("✓ Notificación enviada".to_string());
                self.is_error = false;
                Ok(notification)
            }
            Err(e) => {
                warn!("Failed to create notification: {}", e);
                let classified = classify(e);
                if classified == SubmitError::SessionExpired {
                    if let Err(e) = session.sign_out().await {
                        warn!("Failed to tear down expired session: {}", e);
                    }
                }
                self.status_message = Some(classified.to_string());
                self.is_error = true;
                Err(classified)
            }
        }
    }
}
