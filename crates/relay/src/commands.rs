//! Owner text commands: `!away on [<#channel>] [message]`, `!away off`,
//! `!away status`, `!help`.

use voicewatch_presence::ChannelId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerCommand {
    AwayOn {
        channel: Option<ChannelId>,
        message: Option<String>,
    },
    AwayOff,
    AwayStatus,
    Help,
}

/// Returns `None` for text that is not addressed to the bot.
pub fn parse_command(prefix: &str, text: &str) -> Option<OwnerCommand> {
    let body = text.trim().strip_prefix(prefix)?;
    let (name, rest) = split_word(body);

    match name.to_ascii_lowercase().as_str() {
        "help" => Some(OwnerCommand::Help),
        "away" => Some(parse_away(rest)),
        _ => None,
    }
}

fn parse_away(args: &str) -> OwnerCommand {
    let (sub, rest) = split_word(args);
    match sub.to_ascii_lowercase().as_str() {
        "" | "status" => OwnerCommand::AwayStatus,
        "off" => OwnerCommand::AwayOff,
        "on" => {
            let (first, remainder) = split_word(rest);
            let (channel, message) = match parse_channel_mention(first) {
                Some(channel) => (Some(channel), remainder),
                None => (None, rest),
            };
            let message = message.trim();
            OwnerCommand::AwayOn {
                channel,
                message: (!message.is_empty()).then(|| message.to_string()),
            }
        },
        _ => OwnerCommand::Help,
    }
}

/// `<#123>` → `123`.
fn parse_channel_mention(token: &str) -> Option<ChannelId> {
    let id = token.strip_prefix("<#")?.strip_suffix('>')?;
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then(|| ChannelId::from(id))
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(idx) => (&input[..idx], input[idx..].trim_start()),
        None => (input, ""),
    }
}

pub fn help_text(prefix: &str) -> String {
    format!(
        "**Commands**\n\
         `{prefix}away on [#channel] [message]` turn away mode on\n\
         `{prefix}away off` turn away mode off\n\
         `{prefix}away status` show away mode status\n\
         `{prefix}help` show this list"
    )
}
