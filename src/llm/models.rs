use std::fmt;

use serde::{Deserialize, Serialize};

/// Model identifiers accepted by the chat API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChatModel {
    #[default]
    #[serde(rename = "gemini-2.0-flash")]
    Gemini20Flash,
    #[serde(rename = "gemini-2.0-pro")]
    Gemini20Pro,
}

impl ChatModel {
    /// The only model currently served; everything else is downgraded to it.
    pub const DEFAULT: ChatModel = ChatModel::Gemini20Flash;

    pub fn as_str(self) -> &'static str {
        match self {
            ChatModel::Gemini20Flash => "gemini-2.0-flash",
            ChatModel::Gemini20Pro => "gemini-2.0-pro",
        }
    }

    pub fn is_served(self) -> bool {
        self.served_as() == self
    }

    /// Model that actually answers when `self` is requested.
    pub fn served_as(self) -> ChatModel {
        match self {
            ChatModel::Gemini20Flash => ChatModel::Gemini20Flash,
            ChatModel::Gemini20Pro => ChatModel::DEFAULT,
        }
    }

    /// Ordered candidates tried for a request, first success wins.
    ///
    /// The default always closes the chain, even when it is already the first
    /// candidate, so a transient failure of the served model gets a second try.
    pub fn fallback_chain(self) -> [ChatModel; 2] {
        [self.served_as(), ChatModel::DEFAULT]
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
