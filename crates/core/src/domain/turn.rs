use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who produced an utterance. Wire form is lowercase (`"user"` /
/// `"assistant"`), matching the chat endpoint and the stored column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown speaker `{0}` (expected user|assistant)")]
pub struct UnknownSpeaker(pub String);

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for Speaker {
    type Err = UnknownSpeaker;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(UnknownSpeaker(other.to_string())),
        }
    }
}

/// One submitted utterance, not yet persisted. The conversation window a
/// caller hands to the pipeline is an ordered slice of these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnDraft {
    pub speaker: Speaker,
    pub text: String,
}

impl TurnDraft {
    pub fn user(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::Assistant, text: text.into() }
    }
}

/// A persisted turn. Immutable once stored; `id` and `created_at` are
/// assigned by the store, with `created_at` non-decreasing in insertion
/// order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: i64,
    pub speaker: Speaker,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::Speaker;

    #[test]
    fn speaker_round_trips_through_wire_form() {
        assert_eq!("user".parse::<Speaker>(), Ok(Speaker::User));
        assert_eq!("assistant".parse::<Speaker>(), Ok(Speaker::Assistant));
        assert_eq!(Speaker::User.as_str(), "user");
        assert_eq!(Speaker::Assistant.as_str(), "assistant");
    }

    #[test]
    fn speaker_parse_rejects_unknown_values() {
        assert!("bot".parse::<Speaker>().is_err());
        assert!("".parse::<Speaker>().is_err());
    }

    #[test]
    fn speaker_serializes_lowercase() {
        let json = serde_json::to_string(&Speaker::Assistant).expect("serialize");
        assert_eq!(json, "\"assistant\"");
    }
}
