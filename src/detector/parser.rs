//! Parsing for object detection responses.
//!
//! Detection is a best-effort overlay feature, so it is deliberately more
//! lenient than classification: individual entries with a bad box or an
//! unknown category are skipped with a warning instead of failing the whole
//! batch. A response with no JSON in it at all is still a hard failure.

use serde_json::Value;
use tracing::{debug, warn};

use super::types::{BoundingBox, Detection};
use crate::classifier::{parser::extract_json_object, Category};
use crate::error::ClassifyError;

/// Parse the model's detection response into a list of detections.
///
/// Accepts either `{"detections": [...]}` (the shape the prompt asks for) or
/// a bare top-level array, since models occasionally drop the wrapper.
pub fn parse_detections(text: &str) -> Result<Vec<Detection>, ClassifyError> {
    let trimmed = text.trim();

    // A bare array has no '{' wrapper for the object scanner to find.
    let json: Value = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|e| {
            ClassifyError::MalformedResponse(format!("invalid detection JSON: {}", e))
        })?
    } else {
        let object = extract_json_object(text)?;
        serde_json::from_str(object).map_err(|e| {
            ClassifyError::MalformedResponse(format!("invalid detection JSON: {}", e))
        })?
    };

    let entries = match &json {
        Value::Object(map) => match map.get("detections") {
            Some(Value::Array(arr)) => arr.as_slice(),
            Some(other) => {
                return Err(ClassifyError::SchemaViolation(format!(
                    "'detections' must be an array, got {}",
                    other
                )))
            }
            None => {
                return Err(ClassifyError::SchemaViolation(
                    "missing required field 'detections'".to_string(),
                ))
            }
        },
        Value::Array(arr) => arr.as_slice(),
        other => {
            return Err(ClassifyError::MalformedResponse(format!(
                "detection response is neither object nor array: {}",
                other
            )))
        }
    };

    let mut detections = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match parse_entry(entry) {
            Some(det) => detections.push(det),
            None => {
                warn!("Skipping malformed detection entry {}", index);
                debug!("Entry: {}", entry);
            }
        }
    }

    Ok(detections)
}

fn parse_entry(entry: &Value) -> Option<Detection> {
    let box_values = entry.get("box")?.as_array()?;
    if box_values.len() != 4 {
        return None;
    }
    let mut coords = [0u16; 4];
    for (slot, value) in coords.iter_mut().zip(box_values) {
        let v = value.as_i64()?;
        if !(0..=1000).contains(&v) {
            return None;
        }
        *slot = v as u16;
    }

    let label = entry.get("label")?.as_str()?.to_string();
    let category = Category::parse(entry.get("category")?.as_str()?)?;
    let confidence = entry.get("confidence")?.as_i64()?;
    if !(0..=100).contains(&confidence) {
        return None;
    }

    Some(Detection {
        bounding_box: BoundingBox {
            ymin: coords[0],
            xmin: coords[1],
            ymax: coords[2],
            xmax: coords[3],
        },
        label,
        category,
        confidence: confidence as u8,
    })
}
