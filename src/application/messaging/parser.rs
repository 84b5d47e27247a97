//! Message parser - Parses raw messages into structured messages and actions

use crate::domain::entities::command::CHECK_JOIN_CALLBACK;
use crate::domain::entities::{Action, ActionKind, CommandRegistry, Content, Message};

/// Parses incoming messages into structured Message objects
pub struct MessageParser {
    command_prefix: String,
    registry: CommandRegistry,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
            registry: CommandRegistry::standard(),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Parse a text message
    pub fn parse(&self, chat_id: impl Into<String>, text: impl Into<String>, sender_id: Option<String>) -> Message {
        let text = text.into();
        let chat_id = chat_id.into();

        if text.starts_with('/') || (!self.command_prefix.is_empty() && text.starts_with(&self.command_prefix)) {
            return self.parse_command(chat_id, text, sender_id);
        }

        Message::new(chat_id, Content::Text(text.trim().to_string())).with_sender_opt(sender_id)
    }

    /// Parse a command message
    fn parse_command(&self, chat_id: String, text: String, sender_id: Option<String>) -> Message {
        let cmd_text = if text.starts_with('/') {
            text.trim_start_matches('/')
        } else {
            text.trim_start_matches(&self.command_prefix)
        };

        let mut parts = cmd_text.split_whitespace();
        // Group chats address commands as /start@bot_name
        let name = parts
            .next()
            .map(|n| n.split('@').next().unwrap_or(n))
            .unwrap_or("")
            .to_string();
        let args = parts.map(|s| s.to_string()).collect();

        Message::new(chat_id, Content::Command { name, args }).with_sender_opt(sender_id)
    }

    /// Parse a callback query (inline button press)
    pub fn parse_callback(
        &self,
        chat_id: impl Into<String>,
        callback_id: impl Into<String>,
        data: impl Into<String>,
        sender_id: impl Into<String>,
    ) -> Message {
        let content = Content::Callback {
            id: callback_id.into(),
            data: data.into(),
        };
        Message::new(chat_id, content).with_sender(sender_id)
    }

    /// Map a message onto an action. Unrecognised input yields `None`.
    pub fn to_action(&self, message: &Message) -> Option<Action> {
        let user_id = message.user_id();
        match &message.content {
            Content::Command { name, args } => {
                let command = self.registry.find_command(name)?;
                let payload = match command.kind {
                    ActionKind::Start => args.first().cloned(),
                    _ => None,
                };
                Some(Action::new(command.kind, user_id, payload))
            }
            // Plain text only routes through the menu labels
            Content::Text(text) => {
                let command = self.registry.find_label(text)?;
                Some(Action::new(command.kind, user_id, None))
            }
            Content::Callback { data, .. } if data == CHECK_JOIN_CALLBACK => {
                Some(Action::new(ActionKind::ConfirmJoin, user_id, None))
            }
            Content::Callback { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::command::{BALANCE_LABEL, WITHDRAW_LABEL};

    fn parser() -> MessageParser {
        MessageParser::new("/")
    }

    #[test]
    fn test_start_with_referral_payload() {
        let p = parser();
        let msg = p.parse("10", "/start 42", Some("10".into()));
        assert_eq!(
            p.to_action(&msg),
            Some(Action::Start { user_id: "10".into(), referrer: Some("42".into()) })
        );
    }

    #[test]
    fn test_start_without_payload() {
        let p = parser();
        let msg = p.parse("10", "/start@referral_bot", Some("10".into()));
        assert_eq!(p.to_action(&msg), Some(Action::Start { user_id: "10".into(), referrer: None }));
    }

    #[test]
    fn test_menu_labels() {
        let p = parser();
        let balance = p.parse("10", BALANCE_LABEL, Some("10".into()));
        assert_eq!(p.to_action(&balance), Some(Action::GetBalance { user_id: "10".into() }));

        let withdraw = p.parse("10", WITHDRAW_LABEL, Some("10".into()));
        assert_eq!(p.to_action(&withdraw), Some(Action::RequestWithdraw { user_id: "10".into() }));
    }

    #[test]
    fn test_slash_commands() {
        let p = parser();
        let msg = p.parse("10", "/bonus", Some("10".into()));
        assert_eq!(p.to_action(&msg), Some(Action::ClaimBonus { user_id: "10".into() }));

        let msg = p.parse("10", "/refer ignored", Some("10".into()));
        assert_eq!(p.to_action(&msg), Some(Action::GetReferralLink { user_id: "10".into() }));
    }

    #[test]
    fn test_check_join_callback() {
        let p = parser();
        let msg = p.parse_callback("10", "cb-1", CHECK_JOIN_CALLBACK, "10");
        assert!(matches!(&msg.content, Content::Callback { id, .. } if id == "cb-1"));
        assert_eq!(p.to_action(&msg), Some(Action::ConfirmJoin { user_id: "10".into() }));
    }

    #[test]
    fn test_unknown_input_ignored() {
        let p = parser();
        assert_eq!(p.to_action(&p.parse("10", "hello", Some("10".into()))), None);
        assert_eq!(p.to_action(&p.parse("10", "/pay", Some("10".into()))), None);
        assert_eq!(p.to_action(&p.parse("10", "start", Some("10".into()))), None);
        assert_eq!(p.to_action(&p.parse_callback("10", "cb", "other", "10")), None);
    }

    #[test]
    fn test_bare_command_words_are_not_routed() {
        let p = parser();
        for text in ["balance", "bonus", "Withdraw", "refer", "support"] {
            assert_eq!(p.to_action(&p.parse("10", text, Some("10".into()))), None, "{} was routed", text);
        }
    }

    #[test]
    fn test_sender_falls_back_to_chat() {
        let p = parser();
        let msg = p.parse("77", "/balance", None);
        assert_eq!(p.to_action(&msg), Some(Action::GetBalance { user_id: "77".into() }));
    }
}
