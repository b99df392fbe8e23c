//! Chat message types the gateway speaks.

use serde::{Deserialize, Serialize};

/// Role of a chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System directive
    System,
    /// End-user / engine-authored content
    User,
    /// Prior model output
    Assistant,
}

/// One message in a chat-completion conversation.
///
/// # Examples
///
/// ```
/// use taleweave_core::{ChatMessage, ChatRole};
///
/// let msg = ChatMessage::system("You are a narrator.");
/// assert_eq!(msg.role, ChatRole::System);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender role
    pub role: ChatRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// A system-role message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// A user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}
