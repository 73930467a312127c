use anyhow::{anyhow, bail, Result};

/// One line of interactive input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Help,
    History,
    ShowPreferences,
    TogglePreference(String),
    ClearPreferences,
    /// Open the cart with bundle n (0-based) of the last reply
    Buy(usize),
    /// Append bundle n (0-based) of the last reply to the selection
    AddBundle(usize),
    /// Open the cart with the last reply's missing ingredients
    BuyMissing,
    ShowCart,
    /// Remove item i (0-based) from the selection
    Remove(usize),
    Checkout,
    Cancel,
    Message(String),
}

/// Parses trimmed, non-empty input. Anything not starting with `/` is a chat message.
pub fn parse_command(input: &str) -> Result<Command> {
    if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        return Ok(Command::Exit);
    }

    let Some(rest) = input.strip_prefix('/') else {
        return Ok(Command::Message(input.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match (name.to_ascii_lowercase().as_str(), arg) {
        ("help", _) => Command::Help,
        ("history", _) => Command::History,
        ("prefs", "") => Command::ShowPreferences,
        ("prefs", "clear") => Command::ClearPreferences,
        ("pref", "") => bail!("Usage: /pref <tag>"),
        ("pref", tag) => Command::TogglePreference(tag.to_string()),
        ("buy", n) => Command::Buy(parse_index(n, "/buy <n>")?),
        ("add", n) => Command::AddBundle(parse_index(n, "/add <n>")?),
        ("missing", _) => Command::BuyMissing,
        ("cart", _) => Command::ShowCart,
        ("remove", n) => Command::Remove(parse_index(n, "/remove <i>")?),
        ("checkout", _) => Command::Checkout,
        ("cancel", _) => Command::Cancel,
        ("exit", _) | ("quit", _) => Command::Exit,
        _ => bail!("Unknown command: /{} (try /help)", name),
    };

    Ok(command)
}

/// Converts a 1-based number typed by the user into an index
fn parse_index(arg: &str, usage: &str) -> Result<usize> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(anyhow!("Usage: {} (numbers start at 1)", usage)),
    }
}

/// Matches a typed tag against the configured options, ignoring case
pub fn resolve_tag(input: &str, options: &[String]) -> Option<String> {
    options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(input.trim()))
        .cloned()
}
