use crate::Point;
use ndarray::{arr1, Array1};
use serde::{Deserialize, Serialize};

/// BoundingBox represents the bounding box of the detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left of the bounding box (i.e. min-x)
    x: f32,
    /// Top of the bounding box (i.e. min-y)
    y: f32,
    /// Width of the bounding box
    width: f32,
    /// Height of the bounding box
    height: f32,
}

impl BoundingBox {
    /// Returns a new BoundingBox
    ///
    /// # Parameters
    ///
    /// * `x`: Bounding box left.
    /// * `y`: Bounding box top.
    /// * `width`: Bounding box width.
    /// * `height`: Bounding box height.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> BoundingBox {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns a new BoundingBox from its left, top, right and bottom edges.
    pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> BoundingBox {
        BoundingBox::new(left, top, right - left, bottom - top)
    }

    /// Returns the x of the bounding box
    pub fn x(&self) -> f32 {
        self.x
    }

    /// Returns the y of the bounding box
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Returns the width of the bounding box
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Returns the height of the bounding box
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Returns the area of the bounding box
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Returns the geometric center (centroid) of the bounding box.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Returns the four corners clockwise from the top-left one.
    pub fn corners(&self) -> [Point; 4] {
        let right = self.x + self.width;
        let bottom = self.y + self.height;
        [
            Point::new(self.x, self.y),
            Point::new(right, self.y),
            Point::new(right, bottom),
            Point::new(self.x, bottom),
        ]
    }

    /// Returns the bounding box in left, top, width, height format, i.e., `(min x, min y, width, height)`.
    pub fn to_tlwh(&self) -> Array1<f32> {
        arr1::<f32>(&[self.x, self.y, self.width, self.height])
    }

    /// Intersection over union in `[0.0, 1.0]` with `other`.
    pub fn intersection_over_union(&self, other: &BoundingBox) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}
