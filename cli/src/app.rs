use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use pantry_core::{
    AssistantClient, ChatSession, ChatTurn, ContentSegment, DirectiveExtractor, IngredientDirective,
    PantryConfig,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::commands::{parse_command, resolve_tag, Command};
use crate::logging::log_error;
use crate::output::{
    format_price, print_cart, print_checkout, print_help, print_preferences, print_recipes, print_reply,
    print_turn,
};

/// Segments of each assistant turn, extracted once per turn
#[derive(Debug, Default)]
pub struct SegmentCache {
    segments: HashMap<Uuid, Vec<ContentSegment>>,
}

impl SegmentCache {
    pub fn insert(&mut self, turn_id: Uuid, segments: Vec<ContentSegment>) {
        self.segments.insert(turn_id, segments);
    }

    /// Cached segments for `turn`; turns loaded from a session file are extracted on first use
    pub fn get_or_extract(
        &mut self,
        session: &ChatSession,
        turn: &ChatTurn,
        extractor: &DirectiveExtractor,
    ) -> &[ContentSegment] {
        self.segments
            .entry(turn.id)
            .or_insert_with(|| session.segments_for(turn, extractor))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Presentation-layer state for one chat: the session plus what is needed to render it
pub struct Chat<'a> {
    client: &'a AssistantClient,
    config: &'a PantryConfig,
    session: &'a mut ChatSession,
    extractor: DirectiveExtractor,
    cache: SegmentCache,
    /// Missing ingredients of the last reply, ready for the cart
    missing: Option<IngredientDirective>,
}

impl<'a> Chat<'a> {
    pub fn new(client: &'a AssistantClient, config: &'a PantryConfig, session: &'a mut ChatSession) -> Self {
        Self {
            client,
            config,
            session,
            extractor: DirectiveExtractor::new(config.extractor_config()),
            cache: SegmentCache::default(),
            missing: None,
        }
    }

    /// Sends one message and shows the reply. Transport failures show the
    /// fallback reply instead and are only logged.
    pub async fn send(&mut self, text: &str) {
        let spinner = spinner("Asking the assistant...");
        let tags = self.session.dietary_preferences().to_vec();

        debug!("Sending message: {}", text);
        let (reply, failure) = self
            .client
            .send_or_fallback(text, &tags, self.config.fallback_message())
            .await;
        spinner.finish_and_clear();

        if let Some(e) = failure {
            error!("Assistant request failed: {}", e);
            log_error(&format!("Assistant request failed: {}", e));
        }

        self.session.record_exchange(text, &reply);
        if let Some(turn) = self.session.last_assistant_turn() {
            self.cache.insert(turn.id, reply.segments.clone());
        }

        self.missing = reply.missing_bundle();

        print_reply(&reply.segments);
        print_recipes(&reply.recipes, &reply.missing_ingredients);
    }

    /// Bundles of the most recent assistant reply, in display order
    fn last_bundles(&mut self) -> Vec<IngredientDirective> {
        let Some(turn) = self.session.last_assistant_turn() else {
            return Vec::new();
        };
        self.cache
            .get_or_extract(&*self.session, turn, &self.extractor)
            .iter()
            .filter_map(ContentSegment::as_directive)
            .cloned()
            .collect()
    }

    fn bundle(&mut self, index: usize) -> Option<IngredientDirective> {
        let bundle = self.last_bundles().into_iter().nth(index);
        if bundle.is_none() {
            println!("{}", format!("The last reply has no bundle {}.", index + 1).yellow());
        }
        bundle
    }

    pub async fn handle(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Exit => return Ok(Flow::Exit),
            Command::Help => print_help(),
            Command::Message(text) => self.send(&text).await,
            Command::History => {
                for turn in self.session.history() {
                    let segments = self.cache.get_or_extract(&*self.session, turn, &self.extractor);
                    print_turn(turn, segments);
                }
            }
            Command::ShowPreferences => {
                print_preferences(self.session.dietary_preferences(), &self.config.dietary_options());
            }
            Command::TogglePreference(tag) => {
                let options = self.config.dietary_options();
                match resolve_tag(&tag, &options) {
                    Some(tag) => {
                        self.session.toggle_preference(&tag);
                        print_preferences(self.session.dietary_preferences(), &options);
                    }
                    None => println!(
                        "{}",
                        format!("Unknown preference '{}'. Options: {}", tag, options.join(", ")).yellow()
                    ),
                }
            }
            Command::ClearPreferences => {
                self.session.clear_preferences();
                print_preferences(self.session.dietary_preferences(), &self.config.dietary_options());
            }
            Command::Buy(index) => {
                if let Some(bundle) = self.bundle(index) {
                    self.session.cart.open(&bundle);
                    print_cart(&self.session.cart);
                }
            }
            Command::AddBundle(index) => {
                if let Some(bundle) = self.bundle(index) {
                    self.session.cart.add_directive(&bundle);
                    print_cart(&self.session.cart);
                }
            }
            Command::BuyMissing => match &self.missing {
                Some(bundle) => {
                    self.session.cart.open(bundle);
                    print_cart(&self.session.cart);
                }
                None => println!("{}", "The last reply listed no missing ingredients.".yellow()),
            },
            Command::ShowCart => print_cart(&self.session.cart),
            Command::Remove(index) => match self.session.cart.remove(index) {
                Some(item) => {
                    println!("Removed {} ({})", item.name, format_price(item.price));
                    print_cart(&self.session.cart);
                }
                None => println!("{}", format!("No item {} in the selection.", index + 1).yellow()),
            },
            Command::Checkout => match self.session.cart.checkout() {
                Some(summary) => {
                    info!(items = summary.items.len(), total = summary.total, "checkout");
                    print_checkout(&summary);
                }
                None => println!("{}", "Nothing selected.".yellow()),
            },
            Command::Cancel => {
                self.session.cart.cancel();
                println!("Selection cleared.");
            }
        }
        Ok(Flow::Continue)
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Runs a single query mode, sending one message and displaying the reply
pub async fn run_single_query(
    prompt: String,
    client: &AssistantClient,
    config: &PantryConfig,
    session: &mut ChatSession,
) -> Result<()> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        println!("{}", "Nothing to send.".yellow());
        return Ok(());
    }

    info!("Running single query: {}", prompt);
    Chat::new(client, config, session).send(prompt).await;
    Ok(())
}

/// Runs an interactive chat session. Each send is awaited before the next
/// line is read, so at most one request is in flight.
pub async fn run_interactive_chat(
    client: &AssistantClient,
    config: &PantryConfig,
    session: &mut ChatSession,
) -> Result<()> {
    println!("Chatting with the grocery assistant at {}.", client.endpoint());
    println!("Type /help for commands, 'exit' or 'quit' to end the session.");
    println!();

    let mut chat = Chat::new(client, config, session);

    loop {
        let prefs = chat.session.dietary_preferences();
        if prefs.is_empty() {
            print!("{}: ", "You".green().bold());
        } else {
            print!("{} {}: ", "You".green().bold(), format!("[{}]", prefs.join(", ")).dimmed());
        }
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?;
        if read == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let command = match parse_command(input) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e.to_string().yellow());
                continue;
            }
        };

        if chat.handle(command).await? == Flow::Exit {
            println!("Exiting chat session.");
            break;
        }

        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_core::{ClientConfig, NormalizedReply};

    const REPLY: &str = concat!(
        "## Dal\n\n",
        r#"[BUY_INGREDIENTS:{"items":[{"name":"Lentils","price":120},{"name":"Turmeric","price":30}],"total":150}]"#,
        "\n\n## Khichuri\n\n",
        r#"[BUY_INGREDIENTS:{"items":[{"name":"Rice","price":90}],"total":90}]"#,
    );

    fn offline_client() -> AssistantClient {
        AssistantClient::new(ClientConfig::new("http://127.0.0.1:1")).unwrap()
    }

    fn session_with_reply() -> ChatSession {
        let mut session = ChatSession::default();
        let reply = NormalizedReply {
            text: REPLY.to_string(),
            segments: pantry_core::extract_segments(REPLY),
            recipes: Vec::new(),
            missing_ingredients: Vec::new(),
        };
        session.record_exchange("lentil recipes", &reply);
        session
    }

    #[tokio::test]
    async fn test_buy_add_remove_checkout() {
        let client = offline_client();
        let config = PantryConfig::default();
        let mut session = session_with_reply();
        let mut chat = Chat::new(&client, &config, &mut session);

        chat.handle(Command::Buy(0)).await.unwrap();
        chat.handle(Command::AddBundle(1)).await.unwrap();
        chat.handle(Command::Remove(1)).await.unwrap();
        assert_eq!(chat.session.cart.len(), 2);
        assert_eq!(chat.session.cart.total(), 210.0);

        chat.handle(Command::Checkout).await.unwrap();
        assert!(chat.session.cart.is_empty());
    }

    #[tokio::test]
    async fn test_missing_bundle_leaves_cart_alone() {
        let client = offline_client();
        let config = PantryConfig::default();
        let mut session = session_with_reply();
        let mut chat = Chat::new(&client, &config, &mut session);

        chat.handle(Command::Buy(5)).await.unwrap();
        assert!(!chat.session.cart.is_open());
    }

    #[tokio::test]
    async fn test_preferences_resolve_against_options() {
        let client = offline_client();
        let config = PantryConfig::default();
        let mut session = ChatSession::default();
        let mut chat = Chat::new(&client, &config, &mut session);

        chat.handle(Command::TogglePreference("halal".to_string())).await.unwrap();
        chat.handle(Command::TogglePreference("keto".to_string())).await.unwrap();
        assert_eq!(chat.session.dietary_preferences(), ["Halal".to_string()]);

        chat.handle(Command::ClearPreferences).await.unwrap();
        assert!(chat.session.dietary_preferences().is_empty());
    }

    #[tokio::test]
    async fn test_failed_send_records_fallback_turn() {
        let client = offline_client();
        let config = PantryConfig::default();
        let mut session = ChatSession::default();
        session.toggle_preference("Vegetarian");

        let mut chat = Chat::new(&client, &config, &mut session);
        chat.handle(Command::Message("pasta".to_string())).await.unwrap();

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "pasta");
        assert_eq!(history[1].content, config.fallback_message());
    }

    #[tokio::test]
    async fn test_exit_flow() {
        let client = offline_client();
        let config = PantryConfig::default();
        let mut session = ChatSession::default();
        let mut chat = Chat::new(&client, &config, &mut session);
        assert_eq!(chat.handle(Command::Exit).await.unwrap(), Flow::Exit);
    }

    #[tokio::test]
    async fn test_blank_single_query_sends_nothing() {
        let client = offline_client();
        let config = PantryConfig::default();
        let mut session = ChatSession::default();

        run_single_query("   \n".to_string(), &client, &config, &mut session).await.unwrap();
        assert!(session.history().is_empty());
        assert!(!session.panel_open);
    }

    #[tokio::test]
    async fn test_missing_ingredients_open_cart() {
        let endpoint = spawn_backend(
            r#"{"response":"x","recipes":[{"id":"r1","title":"Dal","prep_time":10}],"missing_ingredients":[{"name":"Rice","price":90}]}"#,
        )
        .await;
        let client = AssistantClient::new(ClientConfig::new(endpoint)).unwrap();
        let config = PantryConfig::default();
        let mut session = ChatSession::default();
        let mut chat = Chat::new(&client, &config, &mut session);

        chat.handle(Command::BuyMissing).await.unwrap();
        assert!(!chat.session.cart.is_open());

        chat.handle(Command::Message("dal".to_string())).await.unwrap();
        chat.handle(Command::BuyMissing).await.unwrap();
        assert!(chat.session.cart.is_open());
        assert_eq!(chat.session.cart.items()[0].name, "Rice");
        assert_eq!(chat.session.cart.total(), 90.0);
    }

    /// Serves `body` from `POST /chat` on an ephemeral port
    async fn spawn_backend(body: &'static str) -> String {
        use axum::{http::header::CONTENT_TYPE, routing::post, Router};
        use std::net::SocketAddr;

        let app = Router::new().route("/chat", post(move || async move { ([(CONTENT_TYPE, "application/json")], body) }));
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = axum::Server::bind(&addr).serve(app.into_make_service());
        let local = server.local_addr();
        tokio::spawn(server);
        format!("http://{}", local)
    }
}
