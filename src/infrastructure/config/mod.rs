//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::application::services::LedgerPolicy;
use crate::domain::entities::{Amount, RequiredGroup};

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub channels: Vec<RequiredGroup>,
    pub ledger: LedgerConfig,
    pub membership: MembershipConfig,
    pub storage: StorageConfig,
    pub health: HealthConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
    pub support_contact: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LedgerConfig {
    pub referral_credit: Amount,
    pub bonus_amount: Amount,
    pub withdraw_threshold: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MembershipConfig {
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    pub path: PathBuf,
}

/// Liveness endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HealthConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// User id the console session acts as
    pub user_id: String,
}

impl Default for Config {
    fn default() -> Self {
        let policy = LedgerPolicy::default();
        Self {
            bot: BotConfig {
                name: "referral-bot".to_string(),
                prefix: "/".to_string(),
                support_contact: "@YourSupportUsername".to_string(),
            },
            channels: vec![
                RequiredGroup::new("Channel 1", "@movie_watch_with_robin"),
                RequiredGroup::new("Channel 2", "@movie_watch_with_robin1"),
                RequiredGroup::new("Channel 3", "@Bot_Domain_foryou"),
            ],
            ledger: LedgerConfig {
                referral_credit: policy.referral_credit,
                bonus_amount: policy.bonus_amount,
                withdraw_threshold: policy.withdraw_threshold,
            },
            membership: MembershipConfig { timeout_seconds: 10 },
            storage: StorageConfig {
                path: PathBuf::from("users.json"),
            },
            health: HealthConfig {
                enabled: true,
                port: 10000,
            },
            adapters: AdaptersConfig {
                telegram: Some(TelegramConfig {
                    enabled: false,
                    token: None,
                }),
                console: Some(ConsoleConfig {
                    enabled: true,
                    user_id: "console".to_string(),
                }),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// Parse only; call `validate` once env overrides are applied
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Defaults with environment overrides, used when there is no config file
    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Environment variables override file values
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            self.set_token(token);
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            self.bot.prefix = prefix;
        }

        if let Ok(path) = std::env::var("DATA_FILE") {
            self.storage.path = PathBuf::from(path);
        }

        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => self.health.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }
    }

    pub fn set_token(&mut self, token: String) {
        match self.adapters.telegram {
            Some(ref mut tg) => {
                tg.token = Some(token);
                tg.enabled = true;
            }
            None => {
                self.adapters.telegram = Some(TelegramConfig {
                    enabled: true,
                    token: Some(token),
                });
            }
        }
    }

    /// Token of an enabled Telegram adapter
    pub fn telegram_token(&self) -> Option<&str> {
        self.adapters
            .telegram
            .as_ref()
            .filter(|t| t.enabled)
            .and_then(|t| t.token.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn console_enabled(&self) -> bool {
        self.adapters.console.as_ref().is_some_and(|c| c.enabled)
    }

    pub fn console_user(&self) -> &str {
        self.adapters
            .console
            .as_ref()
            .map(|c| c.user_id.as_str())
            .unwrap_or("console")
    }

    pub fn ledger_policy(&self) -> LedgerPolicy {
        LedgerPolicy {
            referral_credit: self.ledger.referral_credit,
            bonus_amount: self.ledger.bonus_amount,
            withdraw_threshold: self.ledger.withdraw_threshold,
        }
    }

    pub fn membership_timeout(&self) -> Duration {
        Duration::from_secs(self.membership.timeout_seconds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.membership.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue("membership.timeout-seconds must be positive".into()));
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("storage.path".into()));
        }
        if let Some(group) = self.channels.iter().find(|c| c.handle().is_empty()) {
            return Err(ConfigError::InvalidValue(format!("channel '{}' has no username", group.name)));
        }
        if self.telegram_token().is_none() && !self.console_enabled() {
            return Err(ConfigError::InvalidValue(
                "no adapter enabled: set a Telegram token or enable the console adapter".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let config = Config::from_yaml(&yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.channels.len(), 3);
        assert!(config.console_enabled());
        assert_eq!(config.ledger_policy(), LedgerPolicy::default());
        assert_eq!(config.membership_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_custom_yaml() {
        let yaml = r#"
bot:
  name: my-bot
  prefix: "!"
  support-contact: "@helpdesk"
channels:
  - name: News
    username: "@news"
ledger:
  referral-credit: 2
  bonus-amount: 0.25
  withdraw-threshold: 5
membership:
  timeout-seconds: 3
storage:
  path: data/users.json
health:
  enabled: false
  port: 8080
adapters:
  telegram:
    enabled: true
    token: "123:abc"
  console: ~
"#;
        let config = Config::from_yaml(yaml).unwrap();
        config.validate().unwrap();
        let policy = config.ledger_policy();

        assert_eq!(policy.referral_credit, "2".parse().unwrap());
        assert_eq!(policy.bonus_amount, "0.25".parse().unwrap());
        assert_eq!(policy.withdraw_threshold, 5);
        assert_eq!(config.telegram_token(), Some("123:abc"));
        assert_eq!(config.console_user(), "console");
        assert!(!config.console_enabled());
        assert_eq!(config.channels[0].handle(), "news");
    }

    #[test]
    fn test_rejects_config_without_adapter() {
        let mut config = Config::default();
        config.adapters.console = Some(ConsoleConfig {
            enabled: false,
            user_id: "console".to_string(),
        });
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        config.adapters.console = None;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        // An enabled Telegram adapter without a token does not count
        config.adapters.telegram = Some(TelegramConfig {
            enabled: true,
            token: Some(String::new()),
        });
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        config.set_token("123:abc".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_token_can_arrive_after_parsing() {
        let yaml = r#"
bot:
  name: my-bot
  prefix: "/"
  support-contact: "@helpdesk"
channels: []
ledger:
  referral-credit: 1
  bonus-amount: 0.5
  withdraw-threshold: 20
membership:
  timeout-seconds: 10
storage:
  path: users.json
health:
  enabled: false
  port: 10000
adapters:
  telegram:
    enabled: true
    token: ~
  console:
    enabled: false
    user-id: console
"#;
        let mut config = Config::from_yaml(yaml).unwrap();
        assert!(!config.console_enabled());
        assert!(config.validate().is_err());

        config.set_token("123:abc".to_string());
        assert!(config.validate().is_ok());
    }
}
