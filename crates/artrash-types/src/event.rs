//! Inbound event vocabulary for the dialogue engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An image message, already reduced to what the engine needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundImage {
    pub chat_id: i64,
    pub user_id: i64,
    pub msg_id: i64,
    /// Transport reference for fetching the bytes.
    pub file_id: String,
    /// Declared mime type; photo attachments default to `image/jpeg`.
    pub mime_type: String,
}

/// A button tap on a choice prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceEvent {
    pub chat_id: i64,
    pub user_id: i64,
    /// Message id of the prompt the tap belongs to.
    pub prompt_msg_id: i64,
    /// Transport id used to acknowledge the tap.
    pub callback_id: String,
    pub action: ChoiceAction,
}

/// Bytes fetched back from the transport, with whatever name it knows.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedFile {
    pub bytes: Vec<u8>,
    /// Transport-side path, if any; its extension names archive entries.
    pub path: Option<String>,
}

impl FetchedFile {
    /// File extension from the transport path, lowercased, without the dot.
    pub fn extension(&self) -> Option<String> {
        let path = self.path.as_deref()?;
        let (stem, ext) = path.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() || ext.contains('/') {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// The four buttons a dialogue can show.
///
/// `Art`/`Trash` resolve a fresh classification; `Yes`/`No` resolve a
/// mind-change prompt. The string form is what rides in the transport's
/// callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceAction {
    Art,
    Trash,
    Yes,
    No,
}

/// Callback data that didn't parse as a known action.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown choice action: {0}")]
pub struct UnknownAction(pub String);

impl ChoiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChoiceAction::Art => "verdict:art",
            ChoiceAction::Trash => "verdict:trash",
            ChoiceAction::Yes => "mind:yes",
            ChoiceAction::No => "mind:no",
        }
    }
}

impl std::str::FromStr for ChoiceAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verdict:art" => Ok(ChoiceAction::Art),
            "verdict:trash" => Ok(ChoiceAction::Trash),
            "mind:yes" => Ok(ChoiceAction::Yes),
            "mind:no" => Ok(ChoiceAction::No),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_action_round_trips() {
        for action in [
            ChoiceAction::Art,
            ChoiceAction::Trash,
            ChoiceAction::Yes,
            ChoiceAction::No,
        ] {
            assert_eq!(action.as_str().parse::<ChoiceAction>().unwrap(), action);
        }
    }

    #[test]
    fn test_unknown_callback_data_is_an_error() {
        let err = "verdict:maybe".parse::<ChoiceAction>().unwrap_err();
        assert_eq!(err, UnknownAction("verdict:maybe".to_string()));
    }

    #[test]
    fn test_extension_comes_from_the_transport_path() {
        let f = FetchedFile {
            bytes: vec![1],
            path: Some("photos/file_42.jpg".to_string()),
        };
        assert_eq!(f.extension(), Some("jpg".to_string()));

        let no_ext = FetchedFile {
            bytes: vec![1],
            path: Some("photos/file_42".to_string()),
        };
        assert_eq!(no_ext.extension(), None);

        let none = FetchedFile {
            bytes: vec![1],
            path: None,
        };
        assert_eq!(none.extension(), None);
    }

    #[test]
    fn test_extension_is_lowercased() {
        let f = FetchedFile {
            bytes: vec![1],
            path: Some("photos/file_42.JPG".to_string()),
        };
        assert_eq!(f.extension(), Some("jpg".to_string()));
    }
}
