use crate::{BoundingBox, Point};
use uuid::Uuid;

/// Detection represents a single object observation in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Unique detection identifier
    id: Uuid,
    /// Bounding box in left, top, width, height format.
    bbox: BoundingBox,
    /// Position proxy of the object. The bounding box centroid unless the detector supplies one.
    center: Point,
    /// Detection confidence score.
    score: f32,
    /// Class label.
    label: String,
}

impl Detection {
    /// Returns a new Detection centered on its bounding box.
    ///
    /// # Parameters
    ///
    /// * `id`: An optional identifier. A random one is generated when `None`.
    /// * `bbox`: A bounding box object.
    /// * `score`: Detection confidence score.
    /// * `label`: Class label of the detected object.
    pub fn new<S: Into<String>>(id: Option<Uuid>, bbox: BoundingBox, score: f32, label: S) -> Detection {
        Detection {
            id: id.unwrap_or_else(Uuid::new_v4),
            center: bbox.center(),
            bbox,
            score,
            label: label.into(),
        }
    }

    /// Overrides the center reported by the detector.
    pub fn with_center(mut self, center: Point) -> Detection {
        self.center = center;
        self
    }

    /// Returns the unique id of the detection
    pub fn id(&self) -> &Uuid {
        &self.id
    }

    /// Returns a BoundingBox of the detection co-ordinates
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Returns the center of the detection
    pub fn center(&self) -> Point {
        self.center
    }

    /// Returns the confidence of the detection
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Returns the class label of the detection
    pub fn label(&self) -> &str {
        &self.label
    }
}
