use super::ActionKind;

/// Reply-keyboard labels shown in the main menu
pub const BALANCE_LABEL: &str = "💰 Balance";
pub const REFER_LABEL: &str = "👫 Refer";
pub const BONUS_LABEL: &str = "🎁 Bonus";
pub const WITHDRAW_LABEL: &str = "💸 Withdraw";
pub const SETTINGS_LABEL: &str = "⚙️ Settings";
pub const SUPPORT_LABEL: &str = "🆘 Support";

/// Callback data attached to the "I have joined" button
pub const CHECK_JOIN_CALLBACK: &str = "check_join";

/// Main menu layout, row by row
pub const MENU_LAYOUT: [[&str; 2]; 3] = [
    [BALANCE_LABEL, REFER_LABEL],
    [BONUS_LABEL, WITHDRAW_LABEL],
    [SETTINGS_LABEL, SUPPORT_LABEL],
];

/// A named entry point that maps user input onto an action kind
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub kind: ActionKind,
}

impl Command {
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            aliases: Vec::new(),
            kind,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Command names are case-insensitive
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn has_alias(&self, text: &str) -> bool {
        self.aliases.iter().any(|a| a == text)
    }
}

/// Routing table from command names and menu labels to action kinds
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands understood by the referral bot
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Command::new("start", ActionKind::Start).with_description("Start the bot"));
        registry.register(
            Command::new("balance", ActionKind::Balance)
                .with_description("Show balance and referrals")
                .with_alias(BALANCE_LABEL),
        );
        registry.register(
            Command::new("refer", ActionKind::ReferralLink)
                .with_description("Get your referral link")
                .with_alias(REFER_LABEL),
        );
        registry.register(
            Command::new("bonus", ActionKind::Bonus)
                .with_description("Claim the one-time bonus")
                .with_alias(BONUS_LABEL),
        );
        registry.register(
            Command::new("withdraw", ActionKind::Withdraw)
                .with_description("Request a withdrawal")
                .with_alias(WITHDRAW_LABEL),
        );
        registry.register(
            Command::new("settings", ActionKind::Settings)
                .with_description("Settings")
                .with_alias(SETTINGS_LABEL),
        );
        registry.register(
            Command::new("support", ActionKind::Support)
                .with_description("Contact support")
                .with_alias(SUPPORT_LABEL),
        );
        registry
    }

    /// Registering a name twice replaces the earlier entry
    pub fn register(&mut self, command: Command) {
        self.commands.retain(|c| c.name != command.name);
        self.commands.push(command);
    }

    /// Look up a slash command by name
    pub fn find_command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.has_name(name))
    }

    /// Look up a reply-keyboard label
    pub fn find_label(&self, text: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.has_alias(text))
    }

    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}
