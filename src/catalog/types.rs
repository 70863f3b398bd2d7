use serde::{Deserialize, Serialize};

/// A catalog product record.
///
/// Owned by the catalog provider; the core treats it as read-only input
/// except for the optimistic local stock decrement after checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Provider document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display title.
    pub title: String,
    /// Unit price, >= 0.
    pub price: f64,
    /// Units in stock, >= 0.
    #[serde(default)]
    pub stock: u32,
    /// Category (enum-like string, e.g. "dresses").
    #[serde(default)]
    pub category: String,
    /// Free-form tags; color filters match these.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Multiplier in [0.1, 0.3] scaling how strongly the global discount
    /// applies to this item.
    #[serde(default = "default_emotion_boost", rename = "emotionBoost")]
    pub emotion_boost: f64,
    /// Image reference, display-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Description, display-only.
    #[serde(default)]
    pub description: String,
}

fn default_emotion_boost() -> f64 {
    0.15
}

impl Product {
    /// Build a minimal product, used by tests and demo seeding.
    pub fn new(id: impl Into<String>, title: impl Into<String>, price: f64, stock: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            stock,
            category: String::new(),
            tags: Vec::new(),
            emotion_boost: default_emotion_boost(),
            image: None,
            description: String::new(),
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the emotion boost multiplier.
    pub fn with_emotion_boost(mut self, boost: f64) -> Self {
        self.emotion_boost = boost;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_provider_shape() {
        let json = serde_json::json!({
            "_id": "prod-1",
            "title": "Blue Dress",
            "price": 80.0,
            "stock": 3,
            "category": "dresses",
            "tags": ["blue", "summer"],
            "emotionBoost": 0.2,
            "description": "A calm blue dress"
        });

        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.id, "prod-1");
        assert_eq!(product.stock, 3);
        assert_eq!(product.emotion_boost, 0.2);
        assert_eq!(product.tags, vec!["blue", "summer"]);
    }

    #[test]
    fn test_product_defaults() {
        let json = serde_json::json!({
            "_id": "prod-2",
            "title": "Red Top",
            "price": 40.0
        });

        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.stock, 0);
        assert_eq!(product.emotion_boost, 0.15);
        assert!(product.tags.is_empty());
    }

    #[test]
    fn test_builder_helpers() {
        let product = Product::new("p1", "Scarf", 12.5, 10)
            .with_category("accessories")
            .with_tags(vec!["red".to_string()])
            .with_emotion_boost(0.3);
        assert_eq!(product.category, "accessories");
        assert_eq!(product.emotion_boost, 0.3);
    }
}
