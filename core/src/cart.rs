use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{IngredientDirective, IngredientItem};

/// Items the user is about to add to the cart, curated from one or more directives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSelection {
    items: Vec<IngredientItem>,
    open: bool,
}

/// What a confirmed checkout hands to the (external) cart system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub items: Vec<IngredientItem>,
    pub total: f64,
}

impl CartSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the selection with every item of `directive` preselected,
    /// replacing anything selected before.
    pub fn open(&mut self, directive: &IngredientDirective) {
        self.items = directive.items.clone();
        self.open = true;
        debug!(items = self.items.len(), "cart selection opened");
    }

    /// Appends another directive's items to the current selection
    pub fn add_directive(&mut self, directive: &IngredientDirective) {
        self.items.extend(directive.items.iter().cloned());
        self.open = true;
    }

    pub fn remove(&mut self, index: usize) -> Option<IngredientItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn items(&self) -> &[IngredientItem] {
        &self.items
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of the selected items' prices
    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.price).sum()
    }

    /// Dismisses the selection without buying
    pub fn cancel(&mut self) {
        self.items.clear();
        self.open = false;
    }

    /// Confirms the selection. Nothing happens when it is empty.
    pub fn checkout(&mut self) -> Option<CheckoutSummary> {
        if self.items.is_empty() {
            return None;
        }

        let summary = CheckoutSummary {
            total: self.total(),
            items: std::mem::take(&mut self.items),
        };
        self.open = false;
        debug!(items = summary.items.len(), total = summary.total, "checkout confirmed");
        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(items: &[(&str, f64)]) -> IngredientDirective {
        let items: Vec<IngredientItem> = items
            .iter()
            .map(|(name, price)| IngredientItem::new(*name, *price))
            .collect();
        let total = items.iter().map(|i| i.price).sum();
        IngredientDirective::new(items, total)
    }

    #[test]
    fn test_open_selects_all_items() {
        let mut cart = CartSelection::new();
        cart.open(&directive(&[("Onion", 110.0), ("Ginger", 40.0)]));
        assert!(cart.is_open());
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total(), 150.0);
    }

    #[test]
    fn test_total_recomputed_after_removal() {
        let mut cart = CartSelection::new();
        cart.open(&directive(&[("Onion", 110.0), ("Ginger", 40.0), ("Garlic", 60.0)]));

        let removed = cart.remove(1).unwrap();
        assert_eq!(removed.name, "Ginger");
        assert_eq!(cart.total(), 170.0);
        assert!(cart.remove(5).is_none());
    }

    #[test]
    fn test_open_replaces_and_add_appends() {
        let mut cart = CartSelection::new();
        cart.open(&directive(&[("Onion", 110.0)]));
        cart.open(&directive(&[("Rice", 90.0)]));
        assert_eq!(cart.items()[0].name, "Rice");

        cart.add_directive(&directive(&[("Milk", 80.0)]));
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total(), 170.0);
    }

    #[test]
    fn test_cancel_clears() {
        let mut cart = CartSelection::new();
        cart.open(&directive(&[("Onion", 110.0)]));
        cart.cancel();
        assert!(cart.is_empty());
        assert!(!cart.is_open());
    }

    #[test]
    fn test_checkout() {
        let mut cart = CartSelection::new();
        assert!(cart.checkout().is_none());

        cart.open(&directive(&[("Onion", 110.0), ("Ginger", 40.0)]));
        cart.remove(0);
        let summary = cart.checkout().unwrap();
        assert_eq!(summary.total, 40.0);
        assert_eq!(summary.items.len(), 1);
        assert!(cart.is_empty());
        assert!(!cart.is_open());
    }

    #[test]
    fn test_checkout_on_emptied_selection_does_nothing() {
        let mut cart = CartSelection::new();
        cart.open(&directive(&[("Onion", 110.0)]));
        cart.remove(0);
        assert!(cart.checkout().is_none());
        assert!(cart.is_open());
    }
}
