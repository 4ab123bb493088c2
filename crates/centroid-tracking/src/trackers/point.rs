use crate::*;
use ndarray::Array2;
use tracing::debug;

/// A boolean grid over the frame, indexed `[y, x]`, marking where new objects may appear.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationMask(Array2<bool>);

impl RegistrationMask {
    /// Wraps a grid of shape `(height, width)`.
    pub fn new(mask: Array2<bool>) -> RegistrationMask {
        RegistrationMask(mask)
    }

    /// A mask that accepts the whole frame.
    pub fn full(width: u32, height: u32) -> RegistrationMask {
        RegistrationMask(Array2::from_elem((height as usize, width as usize), true))
    }

    /// A mask that accepts the pixels in `left..left + width`, `top..top + height`.
    pub fn rectangle(frame_width: u32, frame_height: u32, region: &BoundingBox) -> RegistrationMask {
        let (x1, y1) = (region.x(), region.y());
        let (x2, y2) = (x1 + region.width(), y1 + region.height());
        RegistrationMask(Array2::from_shape_fn(
            (frame_height as usize, frame_width as usize),
            |(y, x)| {
                let (x, y) = (x as f32, y as f32);
                x >= x1 && x < x2 && y >= y1 && y < y2
            },
        ))
    }

    /// A mask that accepts the pixels whose center lies inside the polygon `vertices`.
    pub fn polygon(frame_width: u32, frame_height: u32, vertices: &[Point]) -> RegistrationMask {
        RegistrationMask(Array2::from_shape_fn(
            (frame_height as usize, frame_width as usize),
            |(y, x)| inside_polygon(&Point::new(x as f32 + 0.5, y as f32 + 0.5), vertices),
        ))
    }

    /// `(width, height)` of the grid.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.0.ncols(), self.0.nrows())
    }

    /// Whether `point` falls on an accepting pixel. Points outside the grid are rejected.
    pub fn contains(&self, point: &Point) -> bool {
        if !(point.x >= 0.0 && point.y >= 0.0) {
            return false;
        }
        self.0
            .get((point.y as usize, point.x as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Number of accepting pixels.
    pub fn area(&self) -> usize {
        self.0.iter().filter(|accepted| **accepted).count()
    }
}

/// Ray casting point in polygon test.
fn inside_polygon(point: &Point, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (a, b) = (&vertices[i], &vertices[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Matches objects by nearest centroid like [`CentroidTracker`], but only registers new objects whose center lies
/// inside a registration mask, such as the entrance of a scene.
///
/// Unmatched detections outside the mask are discarded. Objects already registered are followed everywhere.
#[derive(Debug, Clone)]
pub struct PointTracker {
    matcher: CentroidTracker,
    registration_mask: RegistrationMask,
}

impl PointTracker {
    pub fn new(matcher: CentroidTracker, registration_mask: RegistrationMask) -> PointTracker {
        PointTracker {
            matcher,
            registration_mask,
        }
    }

    pub fn matcher(&self) -> &CentroidTracker {
        &self.matcher
    }

    pub fn registration_mask(&self) -> &RegistrationMask {
        &self.registration_mask
    }
}

impl MatchingStrategy for PointTracker {
    fn match_objects(
        &mut self,
        info: &SequenceInfo,
        frame: usize,
        registered: &[ObjectDetection<'_>],
        candidates: &[Detection],
    ) -> Vec<Match> {
        self.matcher.match_objects(info, frame, registered, candidates)
    }

    fn admits_registration(&self, detection: &Detection) -> bool {
        let admitted = self.registration_mask.contains(&detection.center());
        if !admitted {
            debug!(center = %detection.center(), "detection outside the registration mask");
        }
        admitted
    }

    fn validate(&self, info: &SequenceInfo) -> Result<()> {
        self.matcher.validate(info)?;
        let (width, height) = self.registration_mask.dimensions();
        if (width, height) != (info.width as usize, info.height as usize) {
            return Err(TrackingError::invalid_config(format!(
                "registration mask is {}x{}, frames are {}x{}",
                width, height, info.width, info.height
            )));
        }
        if self.registration_mask.area() == 0 {
            return Err(TrackingError::invalid_config("registration mask is empty"));
        }
        Ok(())
    }
}
