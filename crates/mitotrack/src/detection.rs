use crate::BoundingBox;
use uuid::Uuid;

/// Detection represents a bounding box detection in a single frame.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Unique detection identifier
    id: Uuid,
    /// Bounding box in corner format.
    bbox: BoundingBox,
    /// Detector class identifier.
    class_id: usize,
    /// Detection confidence score.
    confidence: f32,
}

impl Detection {
    /// Returns a new Detection
    ///
    /// # Parameters
    ///
    /// * `id`: An optional unique identifier; generated when absent.
    /// * `bbox`: A bounding box object.
    /// * `class_id`: The detector class identifier.
    /// * `confidence`: Detection confidence score.
    pub fn new(id: Option<Uuid>, bbox: BoundingBox, class_id: usize, confidence: f32) -> Detection {
        Detection {
            id: id.unwrap_or_else(Uuid::new_v4),
            bbox,
            class_id,
            confidence,
        }
    }

    /// Returns the unique id of the detection
    pub fn id(&self) -> &Uuid {
        &self.id
    }

    /// Returns the bounding box of the detection
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Returns the class identifier of the detection
    pub fn class_id(&self) -> usize {
        self.class_id
    }

    /// Returns the confidence of the detection
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Returns true when the detection can participate in matching.
    ///
    /// A degenerate box or an out-of-range confidence marks the entry as
    /// malformed; malformed detections are treated as "no detection" rather
    /// than as an error.
    pub fn is_well_formed(&self) -> bool {
        !self.bbox.is_degenerate() && (0.0..=1.0).contains(&self.confidence)
    }
}
