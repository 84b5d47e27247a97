use std::sync::Arc;

use crate::application::errors::BotError;
use crate::application::messaging::presenter::{Markup, Presenter, Reply};
use crate::application::messaging::{CommandDispatcher, MessageParser};
use crate::domain::entities::{Content, Message};
use crate::domain::traits::Bot;

/// Service for processing messages: parse, dispatch, render, send
pub struct MessageService<B: Bot + ?Sized> {
    bot: Arc<B>,
    parser: Arc<MessageParser>,
    dispatcher: Arc<CommandDispatcher>,
    presenter: Arc<Presenter>,
}

impl<B: Bot + ?Sized> Clone for MessageService<B> {
    fn clone(&self) -> Self {
        Self {
            bot: self.bot.clone(),
            parser: self.parser.clone(),
            dispatcher: self.dispatcher.clone(),
            presenter: self.presenter.clone(),
        }
    }
}

impl<B: Bot + ?Sized> MessageService<B> {
    pub fn new(
        bot: Arc<B>,
        parser: Arc<MessageParser>,
        dispatcher: Arc<CommandDispatcher>,
        presenter: Arc<Presenter>,
    ) -> Self {
        Self {
            bot,
            parser,
            dispatcher,
            presenter,
        }
    }

    /// Process an incoming message and send the reply, if any.
    /// Returns the reply that was sent.
    pub async fn process(&self, message: Message) -> Result<Option<Reply>, BotError> {
        if let Content::Callback { id, .. } = &message.content {
            if let Err(e) = self.bot.answer_callback(id, None).await {
                tracing::warn!("Failed to answer callback {}: {}", id, e);
            }
        }

        let Some(action) = self.parser.to_action(&message) else {
            tracing::debug!("Ignoring unrecognised {} input from {}", message.platform, message.user_id());
            return Ok(None);
        };
        tracing::debug!("{} from {} via {}", action.kind(), message.user_id(), message.platform);

        let reply = match self.dispatcher.dispatch(action).await {
            Ok(directive) => self.presenter.render(&directive),
            Err(e) => {
                tracing::error!("Action for {} failed: {}", message.user_id(), e);
                self.presenter.failure()
            }
        };

        self.respond(&message.chat_id, &reply).await?;
        Ok(Some(reply))
    }

    /// Send a rendered reply
    pub async fn respond(&self, chat_id: &str, reply: &Reply) -> Result<String, BotError> {
        match &reply.markup {
            Markup::None => self.bot.send_message(chat_id, &reply.text).await,
            Markup::Inline(buttons) => self.bot.send_with_keyboard(chat_id, &reply.text, buttons.clone()).await,
            Markup::Menu(rows) => self.bot.send_with_menu(chat_id, &reply.text, rows.clone()).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::MembershipError;
    use crate::application::services::{Ledger, LedgerPolicy, SessionGate};
    use crate::domain::entities::{Directive, RequiredGroup};
    use crate::domain::traits::{BotInfo, KeyboardButton, MembershipOracle};
    use crate::infrastructure::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingBot {
        sent: Mutex<Vec<(String, String)>>,
        answered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Bot for RecordingBot {
        async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
            self.sent.lock().unwrap().push((chat_id.to_string(), text.to_string()));
            Ok("1".to_string())
        }

        async fn send_with_keyboard(&self, chat_id: &str, text: &str, _buttons: Vec<Vec<KeyboardButton>>) -> Result<String, BotError> {
            self.send_message(chat_id, text).await
        }

        async fn send_with_menu(&self, chat_id: &str, text: &str, _rows: Vec<Vec<String>>) -> Result<String, BotError> {
            self.send_message(chat_id, text).await
        }

        async fn answer_callback(&self, callback_id: &str, _text: Option<&str>) -> Result<(), BotError> {
            self.answered.lock().unwrap().push(callback_id.to_string());
            Ok(())
        }

        fn bot_info(&self) -> BotInfo {
            BotInfo {
                id: "1".into(),
                name: "test".into(),
                username: "test_bot".into(),
            }
        }
    }

    struct Everyone;

    #[async_trait]
    impl MembershipOracle for Everyone {
        async fn check_membership(&self, _user_id: &str, _group: &RequiredGroup) -> Result<bool, MembershipError> {
            Ok(true)
        }
    }

    async fn service() -> (MessageService<RecordingBot>, Arc<RecordingBot>) {
        let bot = Arc::new(RecordingBot::default());
        let ledger = Ledger::open(Arc::new(MemoryStore::new()), LedgerPolicy::default()).await.unwrap();
        let gate = SessionGate::new(
            Arc::new(Everyone),
            vec![RequiredGroup::new("Channel", "@channel")],
            Duration::from_secs(1),
        );
        let dispatcher = Arc::new(CommandDispatcher::new(Arc::new(ledger), gate, "@help"));
        let service = MessageService::new(
            bot.clone(),
            Arc::new(MessageParser::new("/")),
            dispatcher,
            Arc::new(Presenter::new("test_bot")),
        );
        (service, bot)
    }

    #[tokio::test]
    async fn test_callback_is_acknowledged_and_answered() {
        let (service, bot) = service().await;
        let message = service.parser.parse_callback("7", "cb-7", "check_join", "7");

        let reply = service.process(message).await.unwrap().unwrap();

        assert_eq!(*bot.answered.lock().unwrap(), vec!["cb-7".to_string()]);
        assert_eq!(reply, service.presenter.render(&Directive::Welcome { verified: true }));
        assert_eq!(bot.sent.lock().unwrap()[0].0, "7");
    }

    #[tokio::test]
    async fn test_unrecognised_text_sends_nothing() {
        let (service, bot) = service().await;
        let message = service.parser.parse("7", "hello", Some("7".into()));

        assert_eq!(service.process(message).await.unwrap(), None);
        assert!(bot.sent.lock().unwrap().is_empty());
        assert!(bot.answered.lock().unwrap().is_empty());
    }
}
