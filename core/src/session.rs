//! Session state owned by the presentation layer.
//!
//! Everything the chat panel needs to remember between sends lives in
//! [`ChatSession`]: the conversation history, the panel flag, the selected
//! dietary tags and the cart selection. The transport client and the
//! directive extractor stay stateless and take what they need from here.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cart::CartSelection;
use crate::directive::DirectiveExtractor;
use crate::errors::{PantryError, PantryResult};
use crate::types::{ChatTurn, ContentSegment, NormalizedReply};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique session identifier
    pub id: String,
    /// Append-only; insertion order is display order
    history: Vec<ChatTurn>,
    pub panel_open: bool,
    dietary_preferences: Vec<String>,
    pub cart: CartSelection,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

impl ChatSession {
    pub fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            history: Vec::new(),
            panel_open: false,
            dietary_preferences: Vec::new(),
            cart: CartSelection::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn push_turn(&mut self, turn: ChatTurn) {
        // The panel opens with the first message
        if self.history.is_empty() {
            self.panel_open = true;
        }
        self.history.push(turn);
        self.updated_at = Utc::now();
    }

    /// Records a user message and the reply it produced. The user turn holds
    /// the text as typed, without any preference annotation.
    pub fn record_exchange(&mut self, user_text: &str, reply: &NormalizedReply) {
        self.push_turn(ChatTurn::user(user_text));
        self.push_turn(ChatTurn::assistant(reply.text.clone()));
    }

    pub fn last_assistant_turn(&self) -> Option<&ChatTurn> {
        self.history.iter().rev().find(|turn| turn.is_assistant())
    }

    /// Recomputes the segments of an assistant turn. User turns are plain prose.
    pub fn segments_for(&self, turn: &ChatTurn, extractor: &DirectiveExtractor) -> Vec<ContentSegment> {
        if turn.is_assistant() {
            extractor.extract(&turn.content)
        } else {
            vec![ContentSegment::Prose(turn.content.clone())]
        }
    }

    pub fn dietary_preferences(&self) -> &[String] {
        &self.dietary_preferences
    }

    /// Selects `tag` if absent, deselects it otherwise. Returns whether the
    /// tag is selected afterwards.
    pub fn toggle_preference(&mut self, tag: &str) -> bool {
        let selected = if let Some(pos) = self.dietary_preferences.iter().position(|t| t == tag) {
            self.dietary_preferences.remove(pos);
            false
        } else {
            self.dietary_preferences.push(tag.to_string());
            true
        };
        self.updated_at = Utc::now();
        selected
    }

    pub fn clear_preferences(&mut self) {
        self.dietary_preferences.clear();
        self.updated_at = Utc::now();
    }

    pub fn load_from_file(path: &Path) -> PantryResult<Self> {
        let content = fs::read_to_string(path)?;
        let session: Self = serde_json::from_str(&content).map_err(|e| {
            PantryError::Config(format!("Failed to parse session file {}: {}", path.display(), e))
        })?;
        debug!(id = %session.id, turns = session.history.len(), "loaded session");
        Ok(session)
    }

    pub fn save_to_file(&self, path: &Path) -> PantryResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatRole, IngredientDirective, IngredientItem};
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    fn reply(text: &str) -> NormalizedReply {
        NormalizedReply {
            text: text.to_string(),
            segments: crate::directive::extract_segments(text),
            recipes: Vec::new(),
            missing_ingredients: Vec::new(),
        }
    }

    #[test]
    fn test_history_keeps_order_and_untouched_user_text() {
        let mut session = ChatSession::new("s1".to_string());
        assert!(!session.panel_open);

        session.toggle_preference("Vegetarian");
        session.record_exchange("pasta", &reply("Here is a pasta recipe."));
        session.record_exchange("dessert?", &reply("Try payesh."));

        assert!(session.panel_open);
        let roles: Vec<ChatRole> = session.history().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::User, ChatRole::Assistant, ChatRole::User, ChatRole::Assistant]
        );
        assert_eq!(session.history()[0].content, "pasta");
        assert_eq!(session.last_assistant_turn().unwrap().content, "Try payesh.");
    }

    #[test]
    fn test_toggle_preferences() {
        let mut session = ChatSession::default();
        assert!(session.toggle_preference("Halal"));
        assert!(session.toggle_preference("Gluten-Free"));
        assert!(!session.toggle_preference("Halal"));
        assert_eq!(session.dietary_preferences(), ["Gluten-Free".to_string()]);

        session.clear_preferences();
        assert!(session.dietary_preferences().is_empty());
    }

    #[test]
    fn test_segments_recomputed_per_turn() {
        let mut session = ChatSession::default();
        let text = r#"Buy these [BUY_INGREDIENTS:{"items":[{"name":"Egg","price":10}],"total":10}]"#;
        session.record_exchange("[BUY_INGREDIENTS:{}]", &reply(text));

        let extractor = DirectiveExtractor::default();
        let user_segments = session.segments_for(&session.history()[0], &extractor);
        assert_eq!(
            user_segments,
            vec![ContentSegment::Prose("[BUY_INGREDIENTS:{}]".to_string())]
        );

        let assistant = session.last_assistant_turn().unwrap();
        let first = session.segments_for(assistant, &extractor);
        assert_eq!(first, session.segments_for(assistant, &extractor));
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_updated_at_changes() {
        let mut session = ChatSession::default();
        let initial = session.updated_at;

        thread::sleep(Duration::from_millis(5));
        session.toggle_preference("Halal");
        assert!(session.updated_at > initial);

        let after_toggle = session.updated_at;
        thread::sleep(Duration::from_millis(5));
        session.push_turn(ChatTurn::user("hello"));
        assert!(session.updated_at > after_toggle);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions").join("s.json");

        let mut session = ChatSession::new("persisted".to_string());
        session.toggle_preference("Vegetarian");
        session.record_exchange("khichuri", &reply("Recipe text"));
        session.cart.open(&IngredientDirective::new(
            vec![IngredientItem::new("Rice", 90.0)],
            90.0,
        ));
        session.save_to_file(&path).unwrap();

        let loaded = ChatSession::load_from_file(&path).unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.cart.total(), 90.0);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = ChatSession::load_from_file(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(PantryError::Io(_))));
    }
}
