//! Response parsing and schema validation.
//!
//! Converts the model's raw text output into a validated
//! [`ClassificationResult`] or fails explicitly. Parse failures
//! (`MalformedResponse`) and contract failures (`SchemaViolation`) stay
//! distinct all the way up. No retries happen here; retry policy belongs to
//! whoever invokes the model.

use serde_json::Value;
use tracing::{debug, error};

use super::types::{Category, ClassificationResult, ItemClassification};
use crate::error::ClassifyError;

/// Locate the JSON object embedded in `text` and return it as a slice.
///
/// Scans from the first `{` to its matching `}`, counting nested braces and
/// ignoring braces inside string literals. Surrounding prose and markdown
/// fences are tolerated because only the balanced object is returned.
///
/// Fails with `MalformedResponse` when:
/// - the text contains no `{` at all
/// - the object is truncated (no matching `}`)
/// - a second balanced object follows the first (no way to tell which
///   fragment is authoritative)
pub fn extract_json_object(text: &str) -> Result<&str, ClassifyError> {
    let (object, rest) = scan_balanced_object(text)?;

    // A second object after the first means the response is ambiguous.
    if scan_balanced_object(rest).is_ok() {
        return Err(ClassifyError::MalformedResponse(
            "response contains multiple JSON objects".to_string(),
        ));
    }

    Ok(object)
}

/// Find the first balanced `{...}` in `text`. Returns the object slice and
/// the remaining text after it.
fn scan_balanced_object(text: &str) -> Result<(&str, &str), ClassifyError> {
    let start = text.find('{').ok_or_else(|| {
        ClassifyError::MalformedResponse("no JSON object found in response".to_string())
    })?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + i + 1;
                    return Ok((&text[start..end], &text[end..]));
                }
            }
            _ => {}
        }
    }

    Err(ClassifyError::MalformedResponse(
        "JSON object is truncated (unbalanced braces)".to_string(),
    ))
}

/// Parse and validate the model's raw text into a [`ClassificationResult`].
pub fn parse_classification(text: &str) -> Result<ClassificationResult, ClassifyError> {
    let object = extract_json_object(text)?;

    let json: Value = serde_json::from_str(object).map_err(|e| {
        error!("Failed to parse response as JSON: {}", e);
        debug!("Raw response: {}", truncate(text, 500));
        ClassifyError::MalformedResponse(format!("invalid JSON: {}", e))
    })?;

    validate_classification(&json)
}

/// Validate a parsed JSON value against the classification contract.
///
/// Field presence, types, the five-category enumeration, and the confidence
/// range are all checked explicitly. Out-of-range confidence fails rather
/// than being clamped; a fabricated value reaching the UI is worse than an
/// explicit failure.
pub fn validate_classification(json: &Value) -> Result<ClassificationResult, ClassifyError> {
    let items_value = json.get("items").ok_or_else(|| {
        ClassifyError::SchemaViolation("missing required field 'items'".to_string())
    })?;
    let raw_items = items_value.as_array().ok_or_else(|| {
        ClassifyError::SchemaViolation("'items' must be an array".to_string())
    })?;

    let mut items = Vec::with_capacity(raw_items.len());
    for (index, raw) in raw_items.iter().enumerate() {
        items.push(validate_item(raw, index)?);
    }

    let overall_recommendation = require_string(json, "overall_recommendation")?;
    let environmental_tip = require_string(json, "environmental_tip")?;

    Ok(ClassificationResult {
        items,
        overall_recommendation,
        environmental_tip,
    })
}

fn validate_item(raw: &Value, index: usize) -> Result<ItemClassification, ClassifyError> {
    if !raw.is_object() {
        return Err(ClassifyError::SchemaViolation(format!(
            "items[{}] is not an object",
            index
        )));
    }

    let name = require_string(raw, "name")
        .map_err(|e| prefix_item(index, e))?;
    let material = require_string(raw, "material")
        .map_err(|e| prefix_item(index, e))?;
    let disposal_method = require_string(raw, "disposal_method")
        .map_err(|e| prefix_item(index, e))?;

    let category_str = require_string(raw, "category")
        .map_err(|e| prefix_item(index, e))?;
    let category = Category::parse(&category_str).ok_or_else(|| {
        ClassifyError::SchemaViolation(format!(
            "items[{}].category '{}' is not one of the five categories",
            index, category_str
        ))
    })?;

    let confidence_value = raw.get("confidence").ok_or_else(|| {
        ClassifyError::SchemaViolation(format!(
            "items[{}] missing required field 'confidence'",
            index
        ))
    })?;
    let confidence = confidence_value.as_i64().ok_or_else(|| {
        ClassifyError::SchemaViolation(format!(
            "items[{}].confidence must be an integer, got {}",
            index, confidence_value
        ))
    })?;
    if !(0..=100).contains(&confidence) {
        return Err(ClassifyError::SchemaViolation(format!(
            "items[{}].confidence {} outside [0, 100]",
            index, confidence
        )));
    }

    let recyclable = raw
        .get("recyclable")
        .and_then(Value::as_bool)
        .ok_or_else(|| {
            ClassifyError::SchemaViolation(format!(
                "items[{}].recyclable must be a boolean",
                index
            ))
        })?;

    // notes is optional, but if present it must be a string or null
    let notes = match raw.get("notes") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            return Err(ClassifyError::SchemaViolation(format!(
                "items[{}].notes must be a string, got {}",
                index, other
            )))
        }
    };

    Ok(ItemClassification {
        name,
        material,
        category,
        confidence: confidence as u8,
        disposal_method,
        recyclable,
        notes,
    })
}

fn require_string(json: &Value, field: &str) -> Result<String, ClassifyError> {
    match json.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ClassifyError::SchemaViolation(format!(
            "field '{}' must be a string, got {}",
            field, other
        ))),
        None => Err(ClassifyError::SchemaViolation(format!(
            "missing required field '{}'",
            field
        ))),
    }
}

fn prefix_item(index: usize, err: ClassifyError) -> ClassifyError {
    match err {
        ClassifyError::SchemaViolation(msg) => {
            ClassifyError::SchemaViolation(format!("items[{}]: {}", index, msg))
        }
        other => other,
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_response() -> String {
        r#"{"items":[{"name":"Plastic bottle","material":"PET","category":"Recyclable","confidence":92,"disposal_method":"Rinse and recycle","recyclable":true}],"overall_recommendation":"Recycle","environmental_tip":"Reduce single-use plastics"}"#
            .to_string()
    }

    #[test]
    fn test_parse_valid_response() {
        let result = parse_classification(&valid_response()).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "Plastic bottle");
        assert_eq!(result.items[0].material, "PET");
        assert_eq!(result.items[0].category, Category::Recyclable);
        assert_eq!(result.items[0].confidence, 92);
        assert!(result.items[0].recyclable);
        assert!(result.items[0].notes.is_none());
        assert_eq!(result.overall_recommendation, "Recycle");
        assert_eq!(result.environmental_tip, "Reduce single-use plastics");
    }

    #[test]
    fn test_parse_with_surrounding_prose() {
        let text = format!("Here is the result:\n{}", valid_response());
        let result = parse_classification(&text).unwrap();
        assert_eq!(result.items[0].confidence, 92);
    }

    #[test]
    fn test_parse_with_markdown_fences() {
        let text = format!("```json\n{}\n```", valid_response());
        let result = parse_classification(&text).unwrap();
        assert_eq!(result.items[0].category, Category::Recyclable);
    }

    #[test]
    fn test_parse_empty_items_is_valid() {
        let text = r#"{"items":[],"overall_recommendation":"No waste detected","environmental_tip":"N/A"}"#;
        let result = parse_classification(text).unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.overall_recommendation, "No waste detected");
    }

    #[test]
    fn test_no_json_is_malformed() {
        let err = parse_classification("the model refused to answer").unwrap_err();
        assert!(matches!(err, ClassifyError::MalformedResponse(_)));
    }

    #[test]
    fn test_truncated_json_is_malformed() {
        let err = parse_classification(r#"{"items":[{"name":"bottle""#).unwrap_err();
        assert!(matches!(err, ClassifyError::MalformedResponse(_)));
    }

    #[test]
    fn test_multiple_objects_is_malformed() {
        let text = format!("{}\n{}", valid_response(), valid_response());
        let err = parse_classification(&text).unwrap_err();
        assert!(matches!(err, ClassifyError::MalformedResponse(_)));
        assert!(err.to_string().contains("multiple"));
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_scanner() {
        let text = r#"{"items":[],"overall_recommendation":"use the {green} bin","environmental_tip":"ok"}"#;
        let result = parse_classification(text).unwrap();
        assert_eq!(result.overall_recommendation, "use the {green} bin");
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"items":[],"overall_recommendation":"she said \"recycle\"","environmental_tip":"ok"}"#;
        let result = parse_classification(text).unwrap();
        assert!(result.overall_recommendation.contains("recycle"));
    }

    #[test]
    fn test_missing_items_is_schema_violation() {
        let text = r#"{"overall_recommendation":"Recycle","environmental_tip":"tip"}"#;
        let err = parse_classification(text).unwrap_err();
        assert!(matches!(err, ClassifyError::SchemaViolation(_)));
        assert!(err.to_string().contains("items"));
    }

    #[test]
    fn test_items_not_array_is_schema_violation() {
        let text = r#"{"items":"none","overall_recommendation":"r","environmental_tip":"t"}"#;
        let err = parse_classification(text).unwrap_err();
        assert!(matches!(err, ClassifyError::SchemaViolation(_)));
    }

    #[test]
    fn test_invalid_category_is_schema_violation() {
        let text = r#"{"items":[{"name":"thing","material":"unknown","category":"Unknown","confidence":50,"disposal_method":"?","recyclable":false}],"overall_recommendation":"r","environmental_tip":"t"}"#;
        let err = parse_classification(text).unwrap_err();
        assert!(matches!(err, ClassifyError::SchemaViolation(_)));
        assert!(err.to_string().contains("Unknown"));
    }

    #[test]
    fn test_lowercase_category_rejected() {
        let text = r#"{"items":[{"name":"bottle","material":"PET","category":"recyclable","confidence":90,"disposal_method":"bin","recyclable":true}],"overall_recommendation":"r","environmental_tip":"t"}"#;
        let err = parse_classification(text).unwrap_err();
        assert!(matches!(err, ClassifyError::SchemaViolation(_)));
    }

    #[test]
    fn test_confidence_above_range_rejected_not_clamped() {
        let text = r#"{"items":[{"name":"bottle","material":"PET","category":"Recyclable","confidence":101,"disposal_method":"bin","recyclable":true}],"overall_recommendation":"r","environmental_tip":"t"}"#;
        let err = parse_classification(text).unwrap_err();
        assert!(matches!(err, ClassifyError::SchemaViolation(_)));
        assert!(err.to_string().contains("101"));
    }

    #[test]
    fn test_negative_confidence_rejected() {
        let text = r#"{"items":[{"name":"bottle","material":"PET","category":"Recyclable","confidence":-1,"disposal_method":"bin","recyclable":true}],"overall_recommendation":"r","environmental_tip":"t"}"#;
        let err = parse_classification(text).unwrap_err();
        assert!(matches!(err, ClassifyError::SchemaViolation(_)));
    }

    #[test]
    fn test_fractional_confidence_rejected() {
        let text = r#"{"items":[{"name":"bottle","material":"PET","category":"Recyclable","confidence":92.5,"disposal_method":"bin","recyclable":true}],"overall_recommendation":"r","environmental_tip":"t"}"#;
        let err = parse_classification(text).unwrap_err();
        assert!(matches!(err, ClassifyError::SchemaViolation(_)));
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn test_boundary_confidence_values_accepted() {
        for confidence in [0, 100] {
            let text = format!(
                r#"{{"items":[{{"name":"bottle","material":"PET","category":"Recyclable","confidence":{},"disposal_method":"bin","recyclable":true}}],"overall_recommendation":"r","environmental_tip":"t"}}"#,
                confidence
            );
            let result = parse_classification(&text).unwrap();
            assert_eq!(result.items[0].confidence as i64, confidence);
        }
    }

    #[test]
    fn test_recyclable_must_be_boolean() {
        let text = r#"{"items":[{"name":"bottle","material":"PET","category":"Recyclable","confidence":90,"disposal_method":"bin","recyclable":"yes"}],"overall_recommendation":"r","environmental_tip":"t"}"#;
        let err = parse_classification(text).unwrap_err();
        assert!(matches!(err, ClassifyError::SchemaViolation(_)));
        assert!(err.to_string().contains("recyclable"));
    }

    #[test]
    fn test_notes_null_treated_as_absent() {
        let text = r#"{"items":[{"name":"bottle","material":"PET","category":"Recyclable","confidence":90,"disposal_method":"bin","recyclable":true,"notes":null}],"overall_recommendation":"r","environmental_tip":"t"}"#;
        let result = parse_classification(text).unwrap();
        assert!(result.items[0].notes.is_none());
    }

    #[test]
    fn test_notes_string_preserved() {
        let text = r#"{"items":[{"name":"bottle","material":"PET","category":"Recyclable","confidence":90,"disposal_method":"bin","recyclable":true,"notes":"cap still on"}],"overall_recommendation":"r","environmental_tip":"t"}"#;
        let result = parse_classification(text).unwrap();
        assert_eq!(result.items[0].notes.as_deref(), Some("cap still on"));
    }

    #[test]
    fn test_notes_wrong_type_rejected() {
        let text = r#"{"items":[{"name":"bottle","material":"PET","category":"Recyclable","confidence":90,"disposal_method":"bin","recyclable":true,"notes":42}],"overall_recommendation":"r","environmental_tip":"t"}"#;
        let err = parse_classification(text).unwrap_err();
        assert!(matches!(err, ClassifyError::SchemaViolation(_)));
    }

    #[test]
    fn test_missing_recommendation_is_schema_violation() {
        let text = r#"{"items":[],"environmental_tip":"t"}"#;
        let err = parse_classification(text).unwrap_err();
        assert!(matches!(err, ClassifyError::SchemaViolation(_)));
        assert!(err.to_string().contains("overall_recommendation"));
    }

    #[test]
    fn test_error_names_offending_item_index() {
        let text = r#"{"items":[{"name":"ok","material":"PET","category":"Recyclable","confidence":90,"disposal_method":"bin","recyclable":true},{"name":"bad","material":"PET","category":"Recyclable","confidence":200,"disposal_method":"bin","recyclable":true}],"overall_recommendation":"r","environmental_tip":"t"}"#;
        let err = parse_classification(text).unwrap_err();
        assert!(err.to_string().contains("items[1]"));
    }

    #[test]
    fn test_item_order_preserved() {
        let text = r#"{"items":[{"name":"first","material":"PET","category":"Recyclable","confidence":90,"disposal_method":"bin","recyclable":true},{"name":"second","material":"Food","category":"Compostable","confidence":80,"disposal_method":"compost","recyclable":false}],"overall_recommendation":"r","environmental_tip":"t"}"#;
        let result = parse_classification(text).unwrap();
        assert_eq!(result.items[0].name, "first");
        assert_eq!(result.items[1].name, "second");
    }

    #[test]
    fn test_extract_returns_exact_object() {
        let text = "prefix {\"a\": {\"b\": 1}} suffix";
        let object = extract_json_object(text).unwrap();
        assert_eq!(object, "{\"a\": {\"b\": 1}}");
    }
}
