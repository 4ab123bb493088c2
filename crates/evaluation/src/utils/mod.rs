pub mod detections;
pub mod mot;
