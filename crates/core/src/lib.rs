pub mod chat;
pub mod config;
pub mod domain;
pub mod postal;
pub mod prompt;

pub use chat::{ChatEntry, ChatRole, ModelRequest, MAX_WINDOW_TURNS};
pub use domain::turn::{Speaker, Turn, TurnDraft};
pub use postal::{find_postal_code, normalize_postal_code};
pub use prompt::{PolicyVariant, PromptPolicy};
