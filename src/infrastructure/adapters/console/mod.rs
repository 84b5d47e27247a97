//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::application::errors::{BotError, MembershipError};
use crate::domain::entities::RequiredGroup;
use crate::domain::traits::{Bot, BotInfo, KeyboardButton, MembershipOracle};

/// Console bot adapter for local development.
///
/// Every user is reported as a member of every group.
pub struct ConsoleAdapter {
    info: BotInfo,
    input: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "referral-bot".to_string(),
                username: "console".to_string(),
            },
            input: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Read the next line, `None` on end of input
    pub async fn read_line(&self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        use std::io::Write;
        let _ = std::io::stdout().flush();

        let mut input = self.input.lock().await;
        match input.next_line().await {
            Ok(Some(line)) => Some(line.trim().to_string()),
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Failed to read console input: {}", e);
                None
            }
        }
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Split an optional `@<user id>` prefix off a console line.
///
/// `@42 /start 7` acts as user 42; lines without the prefix act as `default_user`.
pub fn split_sender<'a>(line: &'a str, default_user: &'a str) -> (&'a str, &'a str) {
    if let Some(rest) = line.strip_prefix('@') {
        let mut parts = rest.splitn(2, char::is_whitespace);
        if let (Some(user), Some(text)) = (parts.next(), parts.next()) {
            if !user.is_empty() {
                return (user, text.trim());
            }
        }
    }
    (default_user, line)
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        println!("[BOT -> {}] {}", chat_id, text);
        Ok("console_msg".to_string())
    }

    async fn send_with_keyboard(&self, chat_id: &str, text: &str, buttons: Vec<Vec<KeyboardButton>>) -> Result<String, BotError> {
        println!("[BOT -> {}] {}", chat_id, text);
        for row in buttons {
            let row_text: Vec<String> = row
                .iter()
                .map(|b| match (&b.url, &b.callback_data) {
                    (Some(url), _) => format!("{} <{}>", b.text, url),
                    (None, Some(data)) => format!("{} [{}]", b.text, data),
                    (None, None) => b.text.clone(),
                })
                .collect();
            println!("  [Buttons] {}", row_text.join(" | "));
        }
        Ok("console_msg".to_string())
    }

    async fn send_with_menu(&self, chat_id: &str, text: &str, rows: Vec<Vec<String>>) -> Result<String, BotError> {
        println!("[BOT -> {}] {}", chat_id, text);
        for row in rows {
            println!("  [Menu] {}", row.join(" | "));
        }
        Ok("console_msg".to_string())
    }

    async fn answer_callback(&self, _callback_id: &str, _text: Option<&str>) -> Result<(), BotError> {
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

#[async_trait]
impl MembershipOracle for ConsoleAdapter {
    async fn check_membership(&self, _user_id: &str, _group: &RequiredGroup) -> Result<bool, MembershipError> {
        Ok(true)
    }
}
