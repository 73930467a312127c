use clap::Parser;
use std::path::PathBuf;

/// Terminal chat with the grocery assistant: recipes, and the ingredients to buy for them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The message to send to the assistant
    #[arg(index = 1)]
    pub prompt: Option<String>,

    /// Enter interactive chat mode
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,

    /// Dietary preference to send with every message (repeatable)
    #[arg(short = 'p', long = "pref")]
    pub prefs: Vec<String>,

    /// Base URL of the assistant service
    #[arg(long, env = "PANTRY_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Path to the config file (defaults to ~/.config/pantry/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Load the session from this file if it exists and save it back on exit
    #[arg(long)]
    pub session: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
