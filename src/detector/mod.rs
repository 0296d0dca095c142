//! Object detection overlay: bounding boxes with waste categories.

pub mod parser;
pub mod types;

pub use parser::parse_detections;
pub use types::{BoundingBox, Detection};
