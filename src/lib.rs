//! Gemini-backed waste classification engine.
//!
//! The contract at the heart of this crate is small: compose a prompt that
//! pins down five disposal categories and an exact JSON response shape, send
//! it to Gemini with the user's photo, then parse and validate whatever text
//! comes back into a typed [`ClassificationResult`] or fail with a
//! distinguishable error. Prompt composition and parsing are pure functions;
//! the engine wraps them around the API round trip.
//!
//! ```no_run
//! use ecosort_engine::{EngineConfig, GeminiEngine};
//!
//! # async fn run(image_bytes: &[u8]) -> Result<(), ecosort_engine::ClassifyError> {
//! let engine = GeminiEngine::new(EngineConfig::from_env())?;
//! let result = engine.classify_image(image_bytes, Some("Portland, OR")).await?;
//! for item in &result.items {
//!     println!("{} -> {} ({}%)", item.name, item.category, item.confidence);
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod detector;
pub mod engine;
mod error;

pub use classifier::{
    build_classification_prompt, classification_json_schema, parse_classification, Category,
    ClassificationResult, ItemClassification,
};
pub use config::{init_logging, EngineConfig, Task};
pub use detector::{parse_detections, BoundingBox, Detection};
pub use engine::GeminiEngine;
pub use error::ClassifyError;
