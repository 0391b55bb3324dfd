//! Role-tagged request assembly for the completion endpoint.
//!
//! Entry order is significant and fixed: the policy block first, then the
//! window turns in chronological order, then an optional postal annotation
//! last so it carries the highest salience for the model.

use serde::{Deserialize, Serialize};

use crate::domain::turn::{Speaker, TurnDraft};
use crate::prompt::PromptPolicy;

/// Callers truncate the conversation window to this many most-recent turns
/// before invoking the pipeline; the pipeline itself does not bound input.
pub const MAX_WINDOW_TURNS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl From<Speaker> for ChatRole {
    fn from(speaker: Speaker) -> Self {
        match speaker {
            Speaker::User => Self::User,
            Speaker::Assistant => Self::Assistant,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub content: String,
}

impl ChatEntry {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }
}

/// The ordered list of role-tagged entries sent to the completion service
/// for one pipeline invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelRequest {
    entries: Vec<ChatEntry>,
}

impl ModelRequest {
    pub fn assemble(
        policy: &PromptPolicy,
        window: &[TurnDraft],
        postal_note: Option<String>,
    ) -> Self {
        let mut entries = Vec::with_capacity(window.len() + 2);
        entries.push(ChatEntry::system(policy.instructions()));

        for turn in window {
            entries.push(ChatEntry { role: turn.speaker.into(), content: turn.text.clone() });
        }

        if let Some(note) = postal_note {
            entries.push(ChatEntry::system(note));
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn last_entry(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }
}
