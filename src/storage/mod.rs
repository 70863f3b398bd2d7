//! Durable local state: the named store snapshot, order records, and
//! emotion analytics snapshots, backed by SQLite.
//!
//! Order and analytics writes are fire-and-forget from the core's
//! perspective: callers log failures and carry on, checkout never blocks
//! on them.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::emotion::EmotionVector;
use crate::error::StorageResult;
use crate::store::{CartItem, StoreSnapshot};

/// A completed-purchase record emitted for durable storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: String,
    /// Voice session the order was placed in.
    pub session_id: String,
    /// Cart contents at purchase time.
    pub items: Vec<CartItem>,
    /// Sum of price x quantity before discount.
    pub subtotal: f64,
    /// Emotion discount percentage applied.
    pub discount_percent: u8,
    /// Absolute discount amount.
    pub discount_amount: f64,
    /// Amount charged.
    pub total: f64,
    /// Emotion vector in effect at purchase time.
    pub emotion_vector: EmotionVector,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build an order with a fresh id and timestamp.
    pub fn new(
        session_id: impl Into<String>,
        items: Vec<CartItem>,
        subtotal: f64,
        discount_percent: u8,
        emotion_vector: EmotionVector,
    ) -> Self {
        let discount_amount = subtotal * f64::from(discount_percent) / 100.0;
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            items,
            subtotal,
            discount_percent,
            discount_amount,
            total: subtotal - discount_amount,
            emotion_vector,
            created_at: Utc::now(),
        }
    }
}

/// One analytics sample tying an emotion reading to the cart it influenced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSnapshot {
    pub session_id: String,
    pub emotion_vector: EmotionVector,
    pub cart_value: f64,
    pub discount_applied: u8,
    pub created_at: DateTime<Utc>,
}

impl EmotionSnapshot {
    /// Build a snapshot stamped now.
    pub fn new(
        session_id: impl Into<String>,
        emotion_vector: EmotionVector,
        cart_value: f64,
        discount_applied: u8,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            emotion_vector,
            cart_value,
            discount_applied,
            created_at: Utc::now(),
        }
    }
}

/// Storage operations the session depends on.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upsert the store snapshot under its named key.
    async fn save_snapshot(&self, key: &str, snapshot: &StoreSnapshot) -> StorageResult<()>;

    /// Load the store snapshot, if one was persisted.
    async fn load_snapshot(&self, key: &str) -> StorageResult<Option<StoreSnapshot>>;

    /// Insert an order record.
    async fn insert_order(&self, order: &Order) -> StorageResult<()>;

    /// Most recent orders, newest first.
    async fn list_orders(&self, limit: u32) -> StorageResult<Vec<Order>>;

    /// Insert an emotion analytics snapshot.
    async fn insert_emotion_snapshot(&self, snapshot: &EmotionSnapshot) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;

    #[test]
    fn test_order_new_computes_totals() {
        let items = vec![CartItem {
            product: Product::new("p1", "Coat", 50.0, 10),
            quantity: 2,
        }];
        let order = Order::new("sess-1", items, 100.0, 20, EmotionVector::new());

        assert_eq!(order.discount_amount, 20.0);
        assert_eq!(order.total, 80.0);
        assert!(!order.id.is_empty());
    }

    #[test]
    fn test_order_serializes_round_trip() {
        let order = Order::new("sess-1", Vec::new(), 0.0, 0, EmotionVector::new());
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }
}
