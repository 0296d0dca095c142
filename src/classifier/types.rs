//! Types for the classification response contract.
//!
//! These are one-shot transfer objects: built fresh per request from the
//! model's text output, validated once, never mutated afterwards.

use serde::{Deserialize, Serialize};

/// The five waste-disposal categories. The serialized strings are the
/// contract: they appear verbatim in the prompt and are the only legal
/// values of the `category` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Recyclable,
    Compostable,
    Landfill,
    Hazardous,
    #[serde(rename = "Special Handling")]
    SpecialHandling,
}

impl Category {
    /// All categories in prompt order.
    pub const ALL: [Category; 5] = [
        Category::Recyclable,
        Category::Compostable,
        Category::Landfill,
        Category::Hazardous,
        Category::SpecialHandling,
    ];

    /// The exact wire string for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Recyclable => "Recyclable",
            Category::Compostable => "Compostable",
            Category::Landfill => "Landfill",
            Category::Hazardous => "Hazardous",
            Category::SpecialHandling => "Special Handling",
        }
    }

    /// Parse a wire string. Exact match only; anything else is out of
    /// contract and must surface as a schema violation, not be coerced.
    pub fn parse(s: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected waste item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemClassification {
    /// Short label, e.g. "Plastic bottle"
    pub name: String,
    /// Primary material, e.g. "PET"
    pub material: String,
    /// Disposal category
    pub category: Category,
    /// Model-reported certainty, integer percentage 0-100
    pub confidence: u8,
    /// How to dispose of the item
    pub disposal_method: String,
    /// Whether the item is recyclable
    pub recyclable: bool,
    /// Optional free-text observations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Validated classification response for one image.
///
/// `items` holds detections in the order the model reported them; the order
/// is not stable across calls. An empty `items` means "no waste detected"
/// and is a valid result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub items: Vec<ItemClassification>,
    pub overall_recommendation: String,
    pub environmental_tip: String,
}
