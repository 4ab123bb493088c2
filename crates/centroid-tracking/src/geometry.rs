use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Point {
        Point { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Point::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Euclidean distance between two points.
pub fn euclidean_norm(p: &Point, q: &Point) -> f32 {
    (p.x - q.x).hypot(p.y - q.y)
}

/// Distance between `point` and the infinite line through the two points of `line`.
///
/// A degenerate line (both points equal) falls back to the distance to that point.
pub fn point_distance_to_line(point: &Point, line: (&Point, &Point)) -> f32 {
    let (p1, p2) = line;
    let length = euclidean_norm(p1, p2);
    if length == 0.0 {
        return euclidean_norm(point, p1);
    }
    // |(p2 - p1) x (p1 - p3)|
    let cross = (p2.x - p1.x) * (p1.y - point.y) - (p2.y - p1.y) * (p1.x - point.x);
    cross.abs() / length
}

/// Returns the index of the position closest to `line`, or `None` if `positions` is empty.
///
/// Ties resolve to the first position.
pub fn find_closest_position_to_line(positions: &[Point], line: (&Point, &Point)) -> Option<usize> {
    positions
        .iter()
        .map(|position| point_distance_to_line(position, line))
        .enumerate()
        .fold(None, |closest: Option<(usize, f32)>, (index, distance)| match closest {
            Some((_, best)) if best <= distance => closest,
            _ => Some((index, distance)),
        })
        .map(|(index, _)| index)
}
