//! Prompt composition for classification, detection, and tip generation.
//!
//! All composers are pure functions of static template text plus their
//! parameters; the exact category strings and JSON shape here are the
//! contract the parser validates against.

use serde_json;

use super::types::Category;

/// Return the JSON schema for the classification response.
/// Used with structured-output API modes to steer the model toward
/// contract-conforming JSON.
pub fn classification_json_schema() -> serde_json::Value {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    serde_json::json!({
        "type": "object",
        "properties": {
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Short label for the item, e.g. 'Plastic bottle'"
                        },
                        "material": {
                            "type": "string",
                            "description": "Primary material, e.g. 'PET', 'Cardboard'"
                        },
                        "category": {
                            "type": "string",
                            "enum": categories
                        },
                        "confidence": {
                            "type": "integer",
                            "description": "Certainty as integer percentage, 0-100"
                        },
                        "disposal_method": {
                            "type": "string",
                            "description": "Specific disposal instructions"
                        },
                        "recyclable": {
                            "type": "boolean"
                        },
                        "notes": {
                            "type": ["string", "null"],
                            "description": "Optional observations about the item"
                        }
                    },
                    "required": ["name", "material", "category", "confidence",
                                "disposal_method", "recyclable"],
                    "additionalProperties": false
                }
            },
            "overall_recommendation": {
                "type": "string",
                "description": "One-line summary of what to do with everything in the image"
            },
            "environmental_tip": {
                "type": "string",
                "description": "Helpful sustainability tip related to the items"
            }
        },
        "required": ["items", "overall_recommendation", "environmental_tip"],
        "additionalProperties": false
    })
}

/// Build the waste classification prompt.
///
/// The five category names appear verbatim and the required JSON shape is
/// spelled out, including the instruction to always report an integer
/// confidence. An optional region string embeds local recycling guidance.
pub fn build_classification_prompt(region: Option<&str>) -> String {
    let region_note = match region {
        Some(r) => format!(
            "\nApply the recycling rules commonly in force in {}. When local rules \
             differ from general guidance, prefer the local rules.\n",
            r
        ),
        None => String::new(),
    };

    format!(
        r#"You are EcoSort-AI, an expert waste classification assistant.
Analyze the provided image and classify every waste item you can see.

Categories (use these exact strings):
- Recyclable: Paper, cardboard, glass, metal, plastics (types 1, 2, 5)
- Compostable: Food waste, yard waste, compostable packaging
- Landfill: Non-recyclable plastics, mixed materials
- Hazardous: Batteries, electronics, chemicals
- Special Handling: Large items, textiles, construction materials
{region_note}
For each item, always include a confidence score as an integer from 0 to 100.

Respond ONLY with valid JSON in this exact format:
{{
    "items": [
        {{
            "name": "short item label",
            "material": "primary material",
            "category": "one of the five category strings above",
            "confidence": 85,
            "disposal_method": "specific disposal instructions",
            "recyclable": true,
            "notes": "optional observations"
        }}
    ],
    "overall_recommendation": "one-line summary of what to do",
    "environmental_tip": "helpful sustainability tip"
}}

If no waste items are visible, return an empty items array with a suitable
overall_recommendation. Do not invent items that are not in the image."#,
        region_note = region_note,
    )
}

/// Build the object detection prompt. Bounding boxes come back on the
/// model's normalized 0-1000 coordinate scale.
pub fn build_detection_prompt() -> String {
    r#"You are an expert waste detection system. Detect ALL objects visible in
this image that are waste, recyclable items, or everyday objects that will
eventually become waste.

Be inclusive - detect common household items like plastic bottles and bags,
paper and cardboard, food scraps, glass bottles and jars, metal cans,
electronics, batteries, cups, plates, and utensils.

For EACH object detected, provide:
- A bounding box as [ymin, xmin, ymax, xmax] normalized to a 0-1000 scale
  (0 is top/left, 1000 is bottom/right)
- The object label
- The waste category: Recyclable, Compostable, Landfill, Hazardous, or Special Handling
- A confidence score as an integer from 0 to 100

Respond ONLY with valid JSON in this exact format:
{
    "detections": [
        {
            "box": [ymin, xmin, ymax, xmax],
            "label": "object name",
            "category": "waste category",
            "confidence": 85
        }
    ]
}

If no waste items are detected, return: {"detections": []}"#
        .to_string()
}

/// Build a free-text sustainability tip prompt.
pub fn build_tip_prompt(topic: &str) -> String {
    format!(
        "Give one short, practical sustainability tip about {}. \
         Two sentences at most, plain text, no lists or markdown.",
        topic
    )
}
