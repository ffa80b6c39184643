//! Brand and product mentions extracted from a comment by the enrichment step.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity names matched in one comment, partitioned by category.
///
/// This is the canonical form; every upstream representation is coerced into
/// it once at load time so aggregation never branches on shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mentions {
    pub brands: Vec<String>,
    pub products: Vec<String>,
}

impl Mentions {
    #[must_use]
    pub fn new(brands: Vec<String>, products: Vec<String>) -> Self {
        Self { brands, products }
    }

    /// Number of brand plus product mentions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.brands.len() + self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.brands.is_empty() && self.products.is_empty()
    }

    /// Brands first, then products, in stored order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.brands
            .iter()
            .chain(self.products.iter())
            .map(String::as_str)
    }

    /// Coerce an arbitrary JSON value into mentions.
    ///
    /// Only an object carrying both `brands` and `products` as arrays is
    /// accepted; anything else yields the empty default. Non-string array
    /// items are dropped.
    #[must_use]
    pub fn coerce(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        let (Some(Value::Array(brands)), Some(Value::Array(products))) =
            (map.get("brands"), map.get("products"))
        else {
            return Self::default();
        };

        Self {
            brands: string_items(brands),
            products: string_items(products),
        }
    }

    /// Coerce a JSON-encoded mentions document. Unparseable input yields the
    /// empty default.
    #[must_use]
    pub fn from_json_str(raw: &str) -> Self {
        serde_json::from_str::<Value>(raw)
            .map(|v| Self::coerce(&v))
            .unwrap_or_default()
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(ToOwned::to_owned)
        .collect()
}

impl std::fmt::Display for Mentions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "brands: [{}]; products: [{}]",
            self.brands.join(", "),
            self.products.join(", ")
        )
    }
}
