/// Message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Command { name: String, args: Vec<String> },
    /// Inline button press; `id` is the callback query to acknowledge
    Callback { id: String, data: String },
}

/// Transport-neutral inbound message
#[derive(Debug, Clone)]
pub struct Message {
    pub chat_id: String,
    pub sender_id: Option<String>,
    pub content: Content,
    pub platform: String,
}

impl Message {
    pub fn new(chat_id: impl Into<String>, content: Content) -> Self {
        Self {
            chat_id: chat_id.into(),
            sender_id: None,
            content,
            platform: "unknown".to_string(),
        }
    }

    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    pub fn with_sender_opt(mut self, sender_id: Option<String>) -> Self {
        if let Some(id) = sender_id {
            self.sender_id = Some(id);
        }
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// The acting user; private chats fall back to the chat id
    pub fn user_id(&self) -> &str {
        self.sender_id.as_deref().unwrap_or(&self.chat_id)
    }
}
