use serde::{Deserialize, Serialize};

/// Sender of an inbound message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// First name as shown by the chat platform
    pub display_name: String,
}

/// A text message forwarded by the chat transport
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboundMessage {
    pub user: User,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    Markdown,
}

/// The single text reply sent back for an inbound message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reply {
    #[serde(rename = "reply")]
    pub text: String,
    pub parse_mode: ParseMode,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: ParseMode::Plain,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: ParseMode::Markdown,
        }
    }
}
