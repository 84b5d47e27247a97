use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use referral_bot::application::errors::{BotError, ConfigError};
use referral_bot::application::messaging::{CommandDispatcher, MessageParser, Presenter};
use referral_bot::application::services::{Ledger, MessageService, SessionGate};
use referral_bot::domain::entities::command::CHECK_JOIN_CALLBACK;
use referral_bot::domain::entities::Message;
use referral_bot::domain::traits::Bot;
use referral_bot::infrastructure::adapters::console::{split_sender, ConsoleAdapter};
use referral_bot::infrastructure::adapters::telegram::TelegramAdapter;
use referral_bot::infrastructure::config::Config;
use referral_bot::infrastructure::health;
use referral_bot::infrastructure::storage::JsonStore;

#[derive(Parser)]
#[command(name = "referral-bot")]
#[command(about = "Channel-gated referral bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if let Err(e) = run_bot(cli.config, cli.token) {
                tracing::error!("Bot stopped: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("referral-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn load_config(config_path: &str, token_override: Option<String>) -> Result<Config, BotError> {
    let mut config = if std::path::Path::new(config_path).exists() {
        let mut config = Config::load(config_path)?;
        config.apply_env();
        config
    } else {
        tracing::info!("No config at {}, using defaults and environment", config_path);
        Config::load_env()
    };

    if let Some(token) = token_override {
        config.set_token(token);
    }
    config.validate()?;
    Ok(config)
}

fn run_bot(config_path: String, token_override: Option<String>) -> Result<(), BotError> {
    let config = load_config(&config_path, token_override)?;
    tracing::info!("Starting {}", config.bot.name);

    let rt = tokio::runtime::Runtime::new().map_err(|e| BotError::Internal(e.to_string()))?;
    rt.block_on(async {
        // A corrupt snapshot stops startup here instead of being overwritten
        let store = JsonStore::new(&config.storage.path);
        store.init().await?;
        let ledger = Arc::new(Ledger::open(Arc::new(store), config.ledger_policy()).await?);

        if config.health.enabled {
            let port = config.health.port;
            tokio::spawn(async move {
                if let Err(e) = health::serve(port).await {
                    tracing::error!("Liveness endpoint stopped: {}", e);
                }
            });
        }

        let parser = Arc::new(MessageParser::new(&config.bot.prefix));

        if let Some(token) = config.telegram_token() {
            run_telegram_bot(&config, token.to_string(), ledger, parser).await
        } else if config.console_enabled() {
            run_console_bot(&config, ledger, parser).await
        } else {
            Err(ConfigError::InvalidValue("no adapter enabled".into()).into())
        }
    })
}

async fn run_telegram_bot(
    config: &Config,
    token: String,
    ledger: Arc<Ledger>,
    parser: Arc<MessageParser>,
) -> Result<(), BotError> {
    let mut adapter = TelegramAdapter::new(token);
    adapter.fetch_bot_info().await?;
    if let Err(e) = adapter.register_commands(parser.registry()).await {
        tracing::warn!("Failed to register commands: {}", e);
    }

    let bot = Arc::new(adapter);
    let info = bot.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    let gate = SessionGate::new(bot.clone(), config.channels.clone(), config.membership_timeout());
    let dispatcher = Arc::new(CommandDispatcher::new(ledger, gate, &config.bot.support_contact));
    let presenter = Arc::new(Presenter::new(&info.username));
    let service = MessageService::new(bot.clone(), parser.clone(), dispatcher, presenter);

    let mut offset: i64 = 0;
    let timeout_seconds = 30;

    tracing::info!("Starting message loop...");

    loop {
        match bot.get_updates(offset, timeout_seconds).await {
            Ok(updates) => {
                if !updates.is_empty() {
                    tracing::info!("Received {} updates", updates.len());
                }
                if let Some(next) = TelegramAdapter::get_next_offset(&updates) {
                    offset = next;
                }

                // One task per user: a user's actions stay ordered, users run concurrently
                let mut per_user: HashMap<String, Vec<Message>> = HashMap::new();
                for update in &updates {
                    if let Some(message) = TelegramAdapter::to_message(update, &parser) {
                        per_user.entry(message.user_id().to_string()).or_default().push(message);
                    }
                }

                let mut tasks = JoinSet::new();
                for (_, messages) in per_user {
                    let service = service.clone();
                    tasks.spawn(async move {
                        for message in messages {
                            let chat_id = message.chat_id.clone();
                            if let Err(e) = service.process(message).await {
                                tracing::error!("Failed to reply to {}: {}", chat_id, e);
                            }
                        }
                    });
                }
                while let Some(result) = tasks.join_next().await {
                    if let Err(e) = result {
                        tracing::error!("Update task failed: {}", e);
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
            }
        }
    }
}

async fn run_console_bot(config: &Config, ledger: Arc<Ledger>, parser: Arc<MessageParser>) -> Result<(), BotError> {
    tracing::info!("Starting console bot (dev mode)");
    let bot = Arc::new(ConsoleAdapter::new());
    let info = bot.bot_info();

    let gate = SessionGate::new(bot.clone(), config.channels.clone(), config.membership_timeout());
    let dispatcher = Arc::new(CommandDispatcher::new(ledger, gate, &config.bot.support_contact));
    let presenter = Arc::new(Presenter::new(&info.username));
    let service = MessageService::new(bot.clone(), parser.clone(), dispatcher, presenter);
    let default_user = config.console_user().to_string();

    println!("Commands: /start [referrer], /balance, /refer, /bonus, /withdraw, check_join");
    println!("Prefix a line with @<user id> to act as another user.");

    // Main loop (for console mode)
    while let Some(input) = bot.read_line("> ").await {
        if input.is_empty() {
            continue;
        }

        let (user_id, text) = split_sender(&input, &default_user);
        let message = if text == CHECK_JOIN_CALLBACK {
            parser.parse_callback(user_id, "console", text, user_id)
        } else {
            parser.parse(user_id, text, Some(user_id.to_string()))
        };

        match service.process(message.with_platform("console")).await {
            Ok(Some(_)) => {}
            Ok(None) => println!("(unrecognised input)"),
            Err(e) => tracing::error!("Failed to process input: {}", e),
        }
    }

    Ok(())
}

fn init_config() {
    match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => tracing::error!("Failed to render default config: {}", e),
    }
}
