//! Presenter - Turns directives into user-facing text and keyboards

use crate::domain::entities::command::{CHECK_JOIN_CALLBACK, MENU_LAYOUT};
use crate::domain::entities::{BonusClaim, Directive, ForceJoinDirective, WithdrawResult};
use crate::domain::traits::KeyboardButton;

/// Keyboard attached to a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    None,
    Inline(Vec<Vec<KeyboardButton>>),
    Menu(Vec<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub markup: Markup,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: Markup::None,
        }
    }
}

pub struct Presenter {
    bot_username: String,
}

impl Presenter {
    pub fn new(bot_username: impl Into<String>) -> Self {
        Self {
            bot_username: bot_username.into(),
        }
    }

    pub fn referral_link(&self, payload: &str) -> String {
        format!("https://t.me/{}?start={}", self.bot_username, payload)
    }

    pub fn render(&self, directive: &Directive) -> Reply {
        match directive {
            Directive::Welcome { verified } => {
                let text = if *verified {
                    "✅ You're verified!\n👋 Welcome to the Referral Bot!"
                } else {
                    "👋 Welcome to the Referral Bot!\nEarn balance by inviting friends."
                };
                Reply {
                    text: text.to_string(),
                    markup: Markup::Menu(main_menu()),
                }
            }
            Directive::ForceJoin(force_join) => force_join_reply(force_join),
            Directive::NotStarted => Reply::text("❌ Please /start first."),
            Directive::Balance { balance, referrals, required } => Reply::text(format!(
                "💵 Your balance: ${}\n👥 Total referrals: {}\n\n🚨 Note: You must refer at least {} people to enable the withdraw request system.",
                balance, referrals, required
            )),
            Directive::ReferralLink { payload, referrals, required } => Reply::text(format!(
                "🔗 Your referral link:\n{}\n👥 You have referred: {} user(s)\n\n⚠️ Note: You need to refer {} users to activate the withdraw system.",
                self.referral_link(payload),
                referrals,
                required
            )),
            Directive::Bonus(BonusClaim { granted: true, credited, .. }) => {
                Reply::text(format!("🎁 Bonus claimed! You got ${}.", credited))
            }
            Directive::Bonus(BonusClaim { granted: false, .. }) => Reply::text("✅ You already claimed your bonus."),
            Directive::Withdraw(WithdrawResult::ThresholdNotMet { required, .. }) => Reply::text(format!(
                "🚫 Withdraw is currently unavailable.\n\n📣 Refer {} users to activate the withdraw request system.",
                required
            )),
            Directive::Withdraw(WithdrawResult::Eligible { referrals }) => Reply::text(format!(
                "✅ You have {} referrals, so withdraw requests are enabled for you.\n📩 Contact support to request a payout.",
                referrals
            )),
            Directive::Settings => Reply::text("⚙️ Settings is under development."),
            Directive::Support { contact } => Reply::text(format!("📩 Contact us at {}", contact)),
        }
    }

    /// Reply used when an action failed on our side
    pub fn failure(&self) -> Reply {
        Reply::text("⚠️ Something went wrong, please try again later.")
    }
}

fn main_menu() -> Vec<Vec<String>> {
    MENU_LAYOUT
        .iter()
        .map(|row| row.iter().map(|label| label.to_string()).collect())
        .collect()
}

fn force_join_reply(force_join: &ForceJoinDirective) -> Reply {
    let mut buttons: Vec<Vec<KeyboardButton>> = force_join
        .groups
        .iter()
        .map(|group| {
            vec![KeyboardButton::new(format!("🔗 Join {}", group.name))
                .with_url(format!("https://t.me/{}", group.handle()))]
        })
        .collect();
    buttons.push(vec![KeyboardButton::new("✅ I have joined").with_callback(CHECK_JOIN_CALLBACK)]);

    Reply {
        text: "🔒 You must join the following channels to use the bot:".to_string(),
        markup: Markup::Inline(buttons),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Amount, RequiredGroup};

    #[test]
    fn test_force_join_buttons() {
        let presenter = Presenter::new("referral_bot");
        let directive = Directive::ForceJoin(ForceJoinDirective {
            groups: vec![RequiredGroup::new("Channel 1", "@first"), RequiredGroup::new("Channel 2", "@second")],
        });

        let reply = presenter.render(&directive);
        let Markup::Inline(rows) = reply.markup else {
            panic!("expected inline keyboard");
        };
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0].url.as_deref(), Some("https://t.me/first"));
        assert_eq!(rows[1][0].text, "🔗 Join Channel 2");
        assert_eq!(rows[2][0].callback_data.as_deref(), Some(CHECK_JOIN_CALLBACK));
    }

    #[test]
    fn test_referral_link() {
        let presenter = Presenter::new("referral_bot");
        let reply = presenter.render(&Directive::ReferralLink {
            payload: "42".into(),
            referrals: 3,
            required: 20,
        });
        assert!(reply.text.contains("https://t.me/referral_bot?start=42"));
        assert!(reply.text.contains("referred: 3 user(s)"));
    }

    #[test]
    fn test_balance_and_bonus_amounts() {
        let presenter = Presenter::new("referral_bot");
        let balance = presenter.render(&Directive::Balance {
            balance: "1.5".parse().unwrap(),
            referrals: 1,
            required: 20,
        });
        assert!(balance.text.contains("$1.5"));

        let bonus = presenter.render(&Directive::Bonus(BonusClaim {
            granted: true,
            credited: Amount::HALF,
            new_balance: Amount::HALF,
        }));
        assert_eq!(bonus.text, "🎁 Bonus claimed! You got $0.5.");
    }

    #[test]
    fn test_welcome_shows_menu() {
        let presenter = Presenter::new("referral_bot");
        let reply = presenter.render(&Directive::Welcome { verified: false });
        assert_eq!(reply.markup, Markup::Menu(main_menu()));
    }
}
