//! Telegram adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::errors::{BotError, MembershipError};
use crate::application::messaging::MessageParser;
use crate::domain::entities::{CommandRegistry, Message as InboundMessage, RequiredGroup};
use crate::domain::traits::{Bot, BotInfo, KeyboardButton, MembershipOracle};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// Subset of the ChatMember object
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMember {
    pub status: String,
    /// Only present for `restricted` members
    pub is_member: Option<bool>,
}

impl ChatMember {
    /// `left` and `kicked` are outside the chat; a restricted user counts only while still in it
    pub fn is_active(&self) -> bool {
        match self.status.as_str() {
            "left" | "kicked" => false,
            "restricted" => self.is_member.unwrap_or(false),
            _ => true,
        }
    }
}

/// Bot API envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "referral-bot".to_string(),
                username: "referral_bot".to_string(),
            },
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    /// POST a Bot API method and unwrap the envelope
    async fn call<Req, Res>(&self, method: &str, request: &Req) -> Result<Res, BotError>
    where
        Req: Serialize + ?Sized + Sync,
        Res: DeserializeOwned + Send,
    {
        let response = self.client
            .post(self.api_url(method))
            .json(request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let status = response.status();
        let data: ApiResponse<Res> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        match data.result {
            Some(result) if data.ok => Ok(result),
            _ => Err(BotError::Network(format!(
                "Telegram API error ({}): {}",
                status,
                data.description.unwrap_or_default()
            ))),
        }
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        tracing::info!("Connecting to Telegram (token: {}...)", token_prefix(&self.token));

        let url = self.api_url("getMe");
        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let data: ApiResponse<BotInfoResponse> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        let result = data
            .result
            .ok_or_else(|| BotError::Network(data.description.unwrap_or_else(|| "getMe failed".to_string())))?;

        self.info = BotInfo {
            id: result.id.to_string(),
            name: result.first_name,
            username: result.username,
        };

        Ok(())
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string(), "callback_query".to_string()],
        };

        self.call("getUpdates", &request).await
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update]) -> Option<i64> {
        updates.iter().map(|u| u.update_id + 1).max()
    }

    /// Convert an update into a transport-neutral message
    pub fn to_message(update: &Update, parser: &MessageParser) -> Option<InboundMessage> {
        if let Some(msg) = &update.message {
            let text = msg.text.as_deref()?;
            let sender = msg.from.as_ref().map(|u| u.id.to_string());
            return Some(
                parser
                    .parse(msg.chat.id.to_string(), text, sender)
                    .with_platform("telegram"),
            );
        }

        if let Some(cb) = &update.callback_query {
            let data = cb.data.as_deref()?;
            // Callbacks from old messages may arrive without one; reply in the private chat
            let chat_id = cb
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(cb.from.id);
            return Some(
                parser
                    .parse_callback(chat_id.to_string(), cb.id.clone(), data, cb.from.id.to_string())
                    .with_platform("telegram"),
            );
        }

        None
    }

    /// Send a message via Telegram API
    pub async fn send_message_api(&self, chat_id: &str, text: &str, reply_markup: Option<ReplyMarkup>) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: &'a str,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            reply_markup: Option<ReplyMarkup>,
        }

        #[derive(Deserialize)]
        struct MessageResult {
            message_id: i64,
        }

        let request = SendMessageRequest {
            chat_id,
            text,
            reply_markup,
        };

        let result: MessageResult = self.call("sendMessage", &request).await?;
        Ok(result.message_id.to_string())
    }

    /// Register bot commands with Telegram
    pub async fn register_commands(&self, registry: &CommandRegistry) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct Command {
            command: String,
            description: String,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest {
            commands: Vec<Command>,
        }

        let commands = registry
            .all()
            .map(|c| Command {
                command: c.name.clone(),
                description: c.description.clone().unwrap_or_else(|| c.name.clone()),
            })
            .collect();

        let _: bool = self.call("setMyCommands", &SetMyCommandsRequest { commands }).await?;

        tracing::info!("Registered bot commands with Telegram");
        Ok(())
    }

    /// Look up a user's membership in a chat
    pub async fn get_chat_member(&self, chat_id: &str, user_id: i64) -> Result<ChatMember, MembershipError> {
        #[derive(Serialize)]
        struct GetChatMemberRequest<'a> {
            chat_id: &'a str,
            user_id: i64,
        }

        let response = self.client
            .post(self.api_url("getChatMember"))
            .json(&GetChatMemberRequest { chat_id, user_id })
            .send()
            .await
            .map_err(|e| MembershipError::Network(e.to_string()))?;

        let data: ApiResponse<ChatMember> = response
            .json()
            .await
            .map_err(|e| MembershipError::Parse(e.to_string()))?;

        match data.result {
            Some(member) if data.ok => Ok(member),
            _ => Err(MembershipError::Api(data.description.unwrap_or_else(|| "getChatMember failed".to_string()))),
        }
    }
}

/// First characters of the token, safe to log
fn token_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}

/// Reply markup accepted by sendMessage
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline {
        inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
    },
    Keyboard {
        keyboard: Vec<Vec<ReplyKeyboardButton>>,
        resize_keyboard: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardButton {
    text: String,
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        tracing::debug!("Sending to {}: {}", chat_id, text);
        self.send_message_api(chat_id, text, None).await
    }

    async fn send_with_keyboard(&self, chat_id: &str, text: &str, buttons: Vec<Vec<KeyboardButton>>) -> Result<String, BotError> {
        tracing::debug!("Sending with keyboard to {}: {}", chat_id, text);

        let inline_keyboard = buttons
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|btn| InlineKeyboardButton {
                        text: btn.text,
                        callback_data: btn.callback_data,
                        url: btn.url,
                    })
                    .collect()
            })
            .collect();

        self.send_message_api(chat_id, text, Some(ReplyMarkup::Inline { inline_keyboard })).await
    }

    async fn send_with_menu(&self, chat_id: &str, text: &str, rows: Vec<Vec<String>>) -> Result<String, BotError> {
        tracing::debug!("Sending with menu to {}: {}", chat_id, text);

        let keyboard = rows
            .into_iter()
            .map(|row| row.into_iter().map(|text| ReplyKeyboardButton { text }).collect())
            .collect();

        self.send_message_api(
            chat_id,
            text,
            Some(ReplyMarkup::Keyboard {
                keyboard,
                resize_keyboard: true,
            }),
        )
        .await
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct AnswerRequest<'a> {
            callback_query_id: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            text: Option<&'a str>,
        }

        let request = AnswerRequest {
            callback_query_id: callback_id,
            text,
        };

        let _: bool = self.call("answerCallbackQuery", &request).await?;
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

#[async_trait]
impl MembershipOracle for TelegramAdapter {
    async fn check_membership(&self, user_id: &str, group: &RequiredGroup) -> Result<bool, MembershipError> {
        let user_id: i64 = user_id
            .parse()
            .map_err(|_| MembershipError::Parse(format!("invalid Telegram user id: {}", user_id)))?;

        let member = self.get_chat_member(&group.username, user_id).await?;
        Ok(member.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Action, Content};

    fn member(status: &str, is_member: Option<bool>) -> ChatMember {
        ChatMember {
            status: status.to_string(),
            is_member,
        }
    }

    #[test]
    fn test_member_statuses() {
        assert!(member("creator", None).is_active());
        assert!(member("administrator", None).is_active());
        assert!(member("member", None).is_active());
        assert!(member("restricted", Some(true)).is_active());
        assert!(!member("restricted", Some(false)).is_active());
        assert!(!member("left", None).is_active());
        assert!(!member("kicked", None).is_active());
    }

    #[test]
    fn test_parse_chat_member_response() {
        let raw = r#"{"ok":true,"result":{"user":{"id":1,"is_bot":false,"first_name":"A"},"status":"left"}}"#;
        let data: ApiResponse<ChatMember> = serde_json::from_str(raw).unwrap();
        assert!(data.ok);
        assert!(!data.result.unwrap().is_active());
    }

    #[test]
    fn test_start_update_to_action() {
        let raw = r#"{"update_id":5,"message":{"message_id":1,"from":{"id":10,"first_name":"A"},"chat":{"id":10},"text":"/start 42"}}"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let parser = MessageParser::new("/");

        let message = TelegramAdapter::to_message(&update, &parser).unwrap();
        assert_eq!(
            parser.to_action(&message),
            Some(Action::Start { user_id: "10".into(), referrer: Some("42".into()) })
        );
    }

    #[test]
    fn test_callback_update_keeps_query_id() {
        let raw = r#"{"update_id":6,"callback_query":{"id":"abc","from":{"id":10},"message":{"message_id":2,"chat":{"id":10}},"data":"check_join"}}"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let parser = MessageParser::new("/");

        let message = TelegramAdapter::to_message(&update, &parser).unwrap();
        assert_eq!(
            message.content,
            Content::Callback {
                id: "abc".into(),
                data: "check_join".into()
            }
        );
        assert_eq!(message.platform, "telegram");
    }

    #[test]
    fn test_token_prefix_respects_char_boundaries() {
        assert_eq!(token_prefix("123456789:abc"), "12345678");
        assert_eq!(token_prefix("1234567é89"), "1234567é");
        assert_eq!(token_prefix("ключ"), "ключ");
    }

    #[test]
    fn test_next_offset() {
        assert_eq!(TelegramAdapter::get_next_offset(&[]), None);
        let updates: Vec<Update> = serde_json::from_str(r#"[{"update_id":3},{"update_id":9}]"#).unwrap();
        assert_eq!(TelegramAdapter::get_next_offset(&updates), Some(10));
    }

    #[test]
    fn test_menu_markup_serializes_as_reply_keyboard() {
        let markup = ReplyMarkup::Keyboard {
            keyboard: vec![vec![ReplyKeyboardButton { text: "💰 Balance".into() }]],
            resize_keyboard: true,
        };
        let value = serde_json::to_value(&markup).unwrap();
        assert_eq!(value["keyboard"][0][0]["text"], "💰 Balance");
        assert_eq!(value["resize_keyboard"], true);
    }
}
