//! Message template engine
//!
//! Maps a message-intent category plus recipient profile data to a rendered
//! Spanish text used to pre-fill outgoing messages. Selection is
//! deterministic: each category carries an ordered variant table, and the
//! first variant whose required datum is present wins. Rendering is a pure
//! function with no side effects.
//!
//! Placeholders `{name}`, `{skills}`, `{location}` and `{phone}` are replaced
//! literally, every occurrence. A missing recipient name falls back to
//! "Usuario"; other missing fields substitute an empty string, which can
//! leave minor grammatical gaps — accepted behavior, not a defect.

use crate::model::UserSummary;

/// Fallback display name when the recipient has none
const FALLBACK_NAME: &str = "Usuario";

/// Message-intent categories offered by the compose screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateCategory {
    /// First contact with a worker whose profile looked interesting
    InitialInterest,
    /// Ask for more detail about experience and availability
    RequestInfo,
    /// Propose an interview
    InterviewRequest,
    /// Offer a position outright
    JobOffer,
    /// Follow up on an earlier conversation
    FollowUp,
}

impl TemplateCategory {
    /// All categories, in the order the compose screen lists them
    pub const ALL: [TemplateCategory; 5] = [
        TemplateCategory::InitialInterest,
        TemplateCategory::RequestInfo,
        TemplateCategory::InterviewRequest,
        TemplateCategory::JobOffer,
        TemplateCategory::FollowUp,
    ];

    /// UI key for this category
    pub fn key(&self) -> &'static str {
        match self {
            TemplateCategory::InitialInterest => "interest",
            TemplateCategory::RequestInfo => "info",
            TemplateCategory::InterviewRequest => "interview",
            TemplateCategory::JobOffer => "offer",
            TemplateCategory::FollowUp => "follow_up",
        }
    }

    /// Parse a UI key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.key() == key)
    }
}

/// Recipient data the variant predicates inspect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipientProfile {
    /// First name, when known
    pub name: Option<String>,
    /// Declared skill names (e.g. "café", "riego")
    pub skills: Vec<String>,
    /// Raw location string in the backend's "Ciudad,Departamento" form
    pub location: Option<String>,
    /// Whether the worker declares themselves available
    pub available: bool,
}

impl RecipientProfile {
    /// Build a profile from a conversation user plus marketplace profile data
    pub fn from_user(user: &UserSummary, skills: Vec<String>, available: bool) -> Self {
        Self {
            name: Some(user.name.clone()),
            skills,
            location: user.location(),
            available,
        }
    }
}

/// Sender data available for substitution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SenderContext {
    /// Sender's contact phone, offered in interview templates
    pub phone: Option<String>,
}

/// Datum a template variant requires to be selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Requires {
    Location,
    Skills,
    Phone,
    Availability,
    Nothing,
}

/// Per-category variant tables, most specific first
fn variants(category: TemplateCategory) -> &'static [(Requires, &'static str)] {
    match category {
        TemplateCategory::InitialInterest => &[
            (
                Requires::Location,
                "Hola {name}, soy productor agrícola y estoy buscando trabajadores en la zona de \
                 {location}. Vi tu perfil y me gustaría saber si te interesa una oportunidad de \
                 trabajo.",
            ),
            (
                Requires::Skills,
                "Hola {name}, vi tu perfil y me interesa tu experiencia en {skills}. Me gustaría \
                 conversar contigo sobre una oportunidad de trabajo en mi finca.",
            ),
            (
                Requires::Nothing,
                "Hola {name}, vi tu perfil en AgroConecta y me gustaría conversar contigo sobre \
                 una oportunidad de trabajo.",
            ),
        ],
        TemplateCategory::RequestInfo => &[
            (
                Requires::Skills,
                "Hola {name}, quisiera conocer más sobre tu experiencia en {skills}. ¿Podrías \
                 contarme en qué cultivos has trabajado y cuál es tu disponibilidad?",
            ),
            (
                Requires::Nothing,
                "Hola {name}, quisiera conocer más sobre tu experiencia laboral. ¿Podrías \
                 contarme en qué cultivos has trabajado y cuál es tu disponibilidad?",
            ),
        ],
        TemplateCategory::InterviewRequest => &[
            (
                Requires::Phone,
                "Hola {name}, me gustaría coordinar una entrevista contigo. Puedes escribirme \
                 por aquí o llamarme al {phone} para acordar día y hora.",
            ),
            (
                Requires::Nothing,
                "Hola {name}, me gustaría coordinar una entrevista contigo. ¿Qué día y hora te \
                 quedan bien?",
            ),
        ],
        TemplateCategory::JobOffer => &[
            (
                Requires::Availability,
                "Hola {name}, veo que estás disponible para trabajar. Tengo una vacante en mi \
                 finca que podría interesarte y me gustaría ofrecerte el puesto.",
            ),
            (
                Requires::Skills,
                "Hola {name}, tengo una vacante que encaja con tu experiencia en {skills} y me \
                 gustaría ofrecerte el puesto.",
            ),
            (
                Requires::Nothing,
                "Hola {name}, tengo una vacante en mi finca y me gustaría ofrecerte el puesto. \
                 ¿Te interesa conocer los detalles?",
            ),
        ],
        TemplateCategory::FollowUp => &[(
            Requires::Nothing,
            "Hola {name}, te escribo para dar seguimiento a nuestra conversación anterior. \
             ¿Has podido pensarlo?",
        )],
    }
}

/// Render the template for a category against a recipient profile
///
/// Pure and deterministic: the same inputs always produce the same string.
///
/// # Example
/// ```
/// use agroconecta_core::templates::{render, RecipientProfile, SenderContext, TemplateCategory};
///
/// let profile = RecipientProfile {
///     name: Some("Ana".to_string()),
///     skills: vec!["café".to_string()],
///     location: None,
///     available: false,
/// };
/// let text = render(TemplateCategory::RequestInfo, &profile, &SenderContext::default());
/// assert!(text.contains("Ana"));
/// assert!(text.contains("café"));
/// ```
pub fn render(
    category: TemplateCategory,
    profile: &RecipientProfile,
    sender: &SenderContext,
) -> String {
    let template = select_variant(category, profile, sender);

    let name = profile
        .name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(FALLBACK_NAME);
    let skills = profile.skills.join(", ");
    let location = profile
        .location
        .as_deref()
        .map(format_location)
        .unwrap_or_default();
    let phone = sender.phone.clone().unwrap_or_default();

    template
        .replace("{name}", name)
        .replace("{skills}", &skills)
        .replace("{location}", &location)
        .replace("{phone}", &phone)
}

/// Pick the first variant whose required datum is present
fn select_variant(
    category: TemplateCategory,
    profile: &RecipientProfile,
    sender: &SenderContext,
) -> &'static str {
    let table = variants(category);
    for &(requires, template) in table {
        let satisfied = match requires {
            Requires::Location => profile
                .location
                .as_deref()
                .is_some_and(|location| !location.trim().is_empty()),
            Requires::Skills => !profile.skills.is_empty(),
            Requires::Phone => sender
                .phone
                .as_deref()
                .is_some_and(|phone| !phone.trim().is_empty()),
            Requires::Availability => profile.available,
            Requires::Nothing => true,
        };
        if satisfied {
            return template;
        }
    }
    // Every table ends with a Nothing variant
    table[table.len() - 1].1
}

/// Reformat the backend's "Ciudad,Departamento" location with ", " separators
fn format_location(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
