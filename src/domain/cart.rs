//! Cart and wishlist line-item aggregates
//!
//! Both collections are stored as a single JSONB document per user; all
//! mutation rules (merge on duplicate add, no duplicate wishlist entries)
//! live here so the route handlers stay thin.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "product")]
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Cart line items. Adding an existing product increments its quantity
/// rather than inserting a second line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItems(pub Vec<CartLine>);

impl LineItems {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn add(&mut self, product_id: Uuid, quantity: i32) {
        if let Some(existing) = self.0.iter_mut().find(|l| l.product_id == product_id) {
            // Saturate rather than wrap; a merged quantity must stay positive.
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.0.push(CartLine { product_id, quantity });
        }
    }

    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i32) -> Result<(), LineError> {
        let line = self.0.iter_mut().find(|l| l.product_id == product_id).ok_or(LineError::NotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Drops the line for `product_id` if present; removing an absent line
    /// is not an error.
    pub fn remove(&mut self, product_id: Uuid) {
        self.0.retain(|l| l.product_id != product_id);
    }

    pub fn contains(&self, product_id: Uuid) -> bool {
        self.0.iter().any(|l| l.product_id == product_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishLine {
    #[serde(rename = "product")]
    pub product_id: Uuid,
}

/// Wishlist entries: quantity-less, duplicates rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WishItems(pub Vec<WishLine>);

impl WishItems {
    pub fn add(&mut self, product_id: Uuid) -> Result<(), LineError> {
        if self.0.iter().any(|l| l.product_id == product_id) {
            return Err(LineError::Duplicate);
        }
        self.0.push(WishLine { product_id });
        Ok(())
    }

    pub fn remove(&mut self, product_id: Uuid) {
        self.0.retain(|l| l.product_id != product_id);
    }

    pub fn contains(&self, product_id: Uuid) -> bool {
        self.0.iter().any(|l| l.product_id == product_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    NotFound,
    Duplicate,
}

impl std::error::Error for LineError {}
impl std::fmt::Display for LineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "Item not found"),
            Self::Duplicate => write!(f, "Item already present"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_new_line() {
        let p = Uuid::new_v4();
        let mut items = LineItems::default();
        items.add(p, 3);
        assert_eq!(items.0, vec![CartLine { product_id: p, quantity: 3 }]);
    }

    #[test]
    fn test_add_merges_quantities() {
        let p = Uuid::new_v4();
        let mut items = LineItems::default();
        items.add(p, 2);
        items.add(p, 5);
        assert_eq!(items.0.len(), 1);
        assert_eq!(items.0[0].quantity, 7);
    }

    #[test]
    fn test_add_saturates_instead_of_wrapping() {
        let p = Uuid::new_v4();
        let mut items = LineItems::default();
        items.add(p, i32::MAX);
        items.add(p, 1);
        assert_eq!(items.0[0].quantity, i32::MAX);
    }

    #[test]
    fn test_update_missing_line() {
        let mut items = LineItems::default();
        assert_eq!(items.update_quantity(Uuid::new_v4(), 2), Err(LineError::NotFound));
    }

    #[test]
    fn test_remove_is_silent_on_missing() {
        let p = Uuid::new_v4();
        let mut items = LineItems::default();
        items.add(p, 1);
        items.remove(Uuid::new_v4());
        assert_eq!(items.0.len(), 1);
        items.remove(p);
        assert!(items.is_empty());
    }

    #[test]
    fn test_wishlist_rejects_duplicates() {
        let p = Uuid::new_v4();
        let mut items = WishItems::default();
        items.add(p).unwrap();
        assert_eq!(items.add(p), Err(LineError::Duplicate));
        assert_eq!(items.0.len(), 1);
    }

    #[test]
    fn test_cart_line_serializes_product_key() {
        let line = CartLine { product_id: Uuid::nil(), quantity: 1 };
        let json = serde_json::to_value(&line).unwrap();
        assert!(json.get("product").is_some());
    }
}
