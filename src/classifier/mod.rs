//! The classification response contract: prompt composition, response
//! parsing, and schema validation.

pub mod parser;
pub mod prompts;
pub mod types;

pub use parser::{extract_json_object, parse_classification};
pub use prompts::{build_classification_prompt, classification_json_schema};
pub use types::{Category, ClassificationResult, ItemClassification};
