//! Canned responses for running without an API key.
//!
//! Local development and CI should not need a live Gemini key, so the engine
//! falls back to a small pool of realistic responses. The pick is seeded from
//! the image bytes to vary between different uploads but stay deterministic
//! for the same one.

use rand::Rng;

use crate::classifier::{Category, ClassificationResult, ItemClassification};
use crate::detector::{BoundingBox, Detection};

fn seed_from(image_bytes: Option<&[u8]>, modulus: usize) -> usize {
    match image_bytes {
        Some(bytes) if !bytes.is_empty() => {
            let sum: usize = bytes.iter().step_by(97).map(|b| *b as usize).sum();
            (bytes.len() + sum) % modulus
        }
        _ => rand::rng().random_range(0..modulus),
    }
}

/// Mock classification result, varied by image content.
pub fn mock_classification(image_bytes: Option<&[u8]>) -> ClassificationResult {
    let pool = [
        ClassificationResult {
            items: vec![ItemClassification {
                name: "Plastic bottle".to_string(),
                material: "Plastic (PET-1)".to_string(),
                category: Category::Recyclable,
                confidence: 92,
                disposal_method: "Rinse the container and remove the cap. Place in your recycling bin.".to_string(),
                recyclable: true,
                notes: None,
            }],
            overall_recommendation: "Recycle after rinsing".to_string(),
            environmental_tip: "Consider using a reusable water bottle to reduce plastic waste!".to_string(),
        },
        ClassificationResult {
            items: vec![ItemClassification {
                name: "Food scraps".to_string(),
                material: "Organic Food Waste".to_string(),
                category: Category::Compostable,
                confidence: 88,
                disposal_method: "Place in your compost bin or green waste container. Avoid adding meat or dairy to home compost.".to_string(),
                recyclable: false,
                notes: None,
            }],
            overall_recommendation: "Compost in the green bin".to_string(),
            environmental_tip: "Composting reduces methane emissions from landfills and creates nutrient-rich soil!".to_string(),
        },
        ClassificationResult {
            items: vec![ItemClassification {
                name: "Snack wrapper".to_string(),
                material: "Mixed Materials".to_string(),
                category: Category::Landfill,
                confidence: 75,
                disposal_method: "This item contains mixed materials that cannot be easily separated. Place in general waste.".to_string(),
                recyclable: false,
                notes: Some("Multi-layer film is not accepted in curbside recycling".to_string()),
            }],
            overall_recommendation: "Dispose in general waste".to_string(),
            environmental_tip: "Try to avoid products with mixed, non-separable materials when possible.".to_string(),
        },
        ClassificationResult {
            items: vec![ItemClassification {
                name: "Old phone".to_string(),
                material: "Electronic Waste".to_string(),
                category: Category::Hazardous,
                confidence: 95,
                disposal_method: "Do NOT place in regular trash. Take to an e-waste collection center or retailer take-back program.".to_string(),
                recyclable: false,
                notes: None,
            }],
            overall_recommendation: "Take to an e-waste drop-off".to_string(),
            environmental_tip: "E-waste contains valuable materials that can be recovered and reused!".to_string(),
        },
        ClassificationResult {
            items: vec![ItemClassification {
                name: "Glass bottle".to_string(),
                material: "Glass".to_string(),
                category: Category::Recyclable,
                confidence: 90,
                disposal_method: "Rinse and remove any caps or lids. Place in glass recycling bin.".to_string(),
                recyclable: true,
                notes: None,
            }],
            overall_recommendation: "Recycle with glass".to_string(),
            environmental_tip: "Glass can be recycled endlessly without losing quality!".to_string(),
        },
    ];

    pool[seed_from(image_bytes, pool.len())].clone()
}

/// Mock detections, varied by image content.
pub fn mock_detections(image_bytes: Option<&[u8]>) -> Vec<Detection> {
    let pools: [&[(u16, u16, u16, u16, &str, Category, u8)]; 3] = [
        &[
            (200, 100, 600, 400, "Plastic Bottle", Category::Recyclable, 92),
            (300, 500, 700, 850, "Food Container", Category::Compostable, 85),
        ],
        &[
            (150, 200, 500, 600, "Glass Jar", Category::Recyclable, 88),
            (400, 100, 800, 400, "Cardboard Box", Category::Recyclable, 90),
        ],
        &[
            (100, 150, 450, 500, "Banana Peel", Category::Compostable, 95),
            (300, 400, 650, 750, "Vegetable Scraps", Category::Compostable, 91),
            (500, 200, 850, 550, "Paper Bag", Category::Recyclable, 87),
        ],
    ];

    pools[seed_from(image_bytes, pools.len())]
        .iter()
        .map(|&(ymin, xmin, ymax, xmax, label, category, confidence)| Detection {
            bounding_box: BoundingBox {
                ymin,
                xmin,
                ymax,
                xmax,
            },
            label: label.to_string(),
            category,
            confidence,
        })
        .collect()
}

/// Mock sustainability tip.
pub fn mock_tip(topic: &str) -> String {
    format!(
        "Small changes add up: look for reusable alternatives to {} and \
         check your local recycling guide before tossing anything.",
        topic
    )
}
