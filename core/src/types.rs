use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One exchange unit in the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    fn new(role: ChatRole, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content.into())
    }

    pub fn is_assistant(&self) -> bool {
        self.role == ChatRole::Assistant
    }
}

/// A purchasable ingredient inside a directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientItem {
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, alias = "productId", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, alias = "inStock", skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

impl IngredientItem {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            quantity: None,
            unit: None,
            product_id: None,
            in_stock: None,
        }
    }

    /// Price times quantity; a missing quantity counts as one
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity.unwrap_or(1.0)
    }
}

/// Structured "buy ingredients" payload embedded in assistant text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientDirective {
    #[serde(default)]
    pub items: Vec<IngredientItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

impl IngredientDirective {
    pub fn new(items: Vec<IngredientItem>, total: f64) -> Self {
        Self {
            items,
            total: Some(total),
        }
    }

    /// Declared total, or the sum of item prices when the payload omits it.
    pub fn total(&self) -> f64 {
        self.total
            .unwrap_or_else(|| self.items.iter().map(|item| item.price).sum())
    }

    pub fn is_valid(&self) -> bool {
        !self.items.is_empty()
    }

    /// Comma-separated item names, as shown on a bundle
    pub fn item_names(&self) -> String {
        self.items
            .iter()
            .map(|item| item.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One renderable unit of an assistant turn, in source order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ContentSegment {
    Prose(String),
    Directive(IngredientDirective),
}

impl ContentSegment {
    pub fn as_directive(&self) -> Option<&IngredientDirective> {
        match self {
            Self::Directive(directive) => Some(directive),
            Self::Prose(_) => None,
        }
    }
}

/// Recipe record some backend variants return alongside the reply text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub prep_time: Option<u32>,
    #[serde(default)]
    pub cook_time: Option<u32>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
}

/// Request body for `POST /chat`
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response body of `POST /chat`
#[derive(Debug, Deserialize, Serialize)]
pub struct ChatResponseBody {
    #[serde(alias = "message")]
    pub response: String,
    #[serde(default)]
    pub recipes: Vec<RecipeSummary>,
    #[serde(default, alias = "missingIngredients")]
    pub missing_ingredients: Vec<IngredientItem>,
}

/// Display-ready result of one successful (or failed) send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReply {
    /// Raw reply text, kept as the assistant turn's content
    pub text: String,
    pub segments: Vec<ContentSegment>,
    #[serde(default)]
    pub recipes: Vec<RecipeSummary>,
    #[serde(default)]
    pub missing_ingredients: Vec<IngredientItem>,
}

impl NormalizedReply {
    /// Reply shown when the assistant service could not be reached
    pub fn fallback(message: &str) -> Self {
        Self {
            text: message.to_string(),
            segments: vec![ContentSegment::Prose(message.to_string())],
            recipes: Vec::new(),
            missing_ingredients: Vec::new(),
        }
    }

    pub fn directives(&self) -> impl Iterator<Item = &IngredientDirective> {
        self.segments.iter().filter_map(ContentSegment::as_directive)
    }

    /// The reply's missing ingredients as one purchasable bundle.
    ///
    /// Each item's price becomes its line total so the cart sums the same
    /// amount the recipe card shows. `None` when nothing is missing.
    pub fn missing_bundle(&self) -> Option<IngredientDirective> {
        if self.missing_ingredients.is_empty() {
            return None;
        }

        let items: Vec<IngredientItem> = self
            .missing_ingredients
            .iter()
            .map(|item| IngredientItem {
                price: item.line_total(),
                ..item.clone()
            })
            .collect();
        let total = items.iter().map(|item| item.price).sum();
        Some(IngredientDirective::new(items, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_total_falls_back_to_item_sum() {
        let directive: IngredientDirective = serde_json::from_str(
            r#"{"items":[{"name":"Onion","price":110},{"name":"Ginger","price":40.5}]}"#,
        )
        .unwrap();
        assert_eq!(directive.total, None);
        assert_eq!(directive.total(), 150.5);
        assert_eq!(directive.item_names(), "Onion, Ginger");
    }

    #[test]
    fn test_item_accepts_camel_case_fields() {
        let item: IngredientItem = serde_json::from_str(
            r#"{"name":"Rice","price":90,"quantity":2,"unit":"kg","productId":"p-7","inStock":false}"#,
        )
        .unwrap();
        assert_eq!(item.product_id.as_deref(), Some("p-7"));
        assert_eq!(item.in_stock, Some(false));
        assert_eq!(item.quantity, Some(2.0));
    }

    #[test]
    fn test_response_body_minimal() {
        let body: ChatResponseBody = serde_json::from_str(r#"{"response":"hi"}"#).unwrap();
        assert_eq!(body.response, "hi");
        assert!(body.recipes.is_empty());
        assert!(body.missing_ingredients.is_empty());
    }

    #[test]
    fn test_segment_serialization_is_tagged() {
        let json = serde_json::to_value(ContentSegment::Prose("hello".to_string())).unwrap();
        assert_eq!(json["kind"], "prose");
        assert_eq!(json["data"], "hello");
    }

    #[test]
    fn test_fallback_reply_is_single_prose_segment() {
        let reply = NormalizedReply::fallback("sorry");
        assert_eq!(reply.segments, vec![ContentSegment::Prose("sorry".to_string())]);
        assert_eq!(reply.directives().count(), 0);
    }

    #[test]
    fn test_missing_ingredients_become_bundle() {
        let body: ChatResponseBody = serde_json::from_str(
            r#"{"response":"x","recipes":[{"id":"r1","title":"Dal","prep_time":10}],
                "missingIngredients":[{"name":"Rice","price":90},{"name":"Egg","price":12,"quantity":6,"unit":"pcs"}]}"#,
        )
        .unwrap();
        assert_eq!(body.recipes[0].prep_time, Some(10));
        assert_eq!(body.recipes[0].cook_time, None);

        let reply = NormalizedReply {
            text: body.response,
            segments: Vec::new(),
            recipes: body.recipes,
            missing_ingredients: body.missing_ingredients,
        };
        let bundle = reply.missing_bundle().unwrap();
        assert_eq!(bundle.item_names(), "Rice, Egg");
        assert_eq!(bundle.items[1].price, 72.0);
        assert_eq!(bundle.items[1].unit.as_deref(), Some("pcs"));
        assert_eq!(bundle.total(), 162.0);
    }

    #[test]
    fn test_no_missing_ingredients_no_bundle() {
        assert!(NormalizedReply::fallback("sorry").missing_bundle().is_none());
    }
}
