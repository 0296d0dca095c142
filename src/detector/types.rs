//! Types for object detection responses.

use serde::{Deserialize, Serialize};

use crate::classifier::Category;

/// Bounding box on the model's normalized 0-1000 coordinate scale,
/// ordered [ymin, xmin, ymax, xmax] as the detection prompt requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub ymin: u16,
    pub xmin: u16,
    pub ymax: u16,
    pub xmax: u16,
}

impl BoundingBox {
    /// Convert to pixel coordinates (x1, y1, x2, y2) for an image of the
    /// given dimensions. Intermediate products are computed in u64 so very
    /// wide or tall images cannot overflow.
    pub fn to_pixel_rect(self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let scale = |coord: u16, extent: u32| ((coord as u64 * extent as u64) / 1000) as u32;
        (
            scale(self.xmin, width),
            scale(self.ymin, height),
            scale(self.xmax, width),
            scale(self.ymax, height),
        )
    }
}

/// One detected object with its location and waste category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
    pub label: String,
    pub category: Category,
    /// Integer percentage 0-100
    pub confidence: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pixel_rect_scales_coordinates() {
        let bb = BoundingBox {
            ymin: 200,
            xmin: 100,
            ymax: 600,
            xmax: 400,
        };
        let (x1, y1, x2, y2) = bb.to_pixel_rect(2000, 1000);
        assert_eq!((x1, y1, x2, y2), (200, 200, 800, 600));
    }

    #[test]
    fn test_to_pixel_rect_full_extent() {
        let bb = BoundingBox {
            ymin: 0,
            xmin: 0,
            ymax: 1000,
            xmax: 1000,
        };
        let (x1, y1, x2, y2) = bb.to_pixel_rect(640, 480);
        assert_eq!((x1, y1, x2, y2), (0, 0, 640, 480));
    }

    #[test]
    fn test_to_pixel_rect_very_large_image_no_overflow() {
        // 1000 * 5_000_000 exceeds u32; the intermediate must be wider.
        let bb = BoundingBox {
            ymin: 0,
            xmin: 500,
            ymax: 1000,
            xmax: 1000,
        };
        let (x1, y1, x2, y2) = bb.to_pixel_rect(5_000_000, 5_000_000);
        assert_eq!((x1, y1, x2, y2), (2_500_000, 0, 5_000_000, 5_000_000));
    }

    #[test]
    fn test_detection_serializes_box_field_name() {
        let det = Detection {
            bounding_box: BoundingBox {
                ymin: 1,
                xmin: 2,
                ymax: 3,
                xmax: 4,
            },
            label: "Plastic Bottle".to_string(),
            category: Category::Recyclable,
            confidence: 92,
        };
        let json = serde_json::to_string(&det).unwrap();
        assert!(json.contains("\"box\""));
        assert!(!json.contains("bounding_box"));
    }
}
