//! Multi-object tracking by centroid association.
//!
//! An [`ObjectTracker`] walks a [`Sequence`] frame by frame, gets the detections of each frame from an
//! [`ObjectDetector`] or from precomputed lists, and hands them to a pluggable [`MatchingStrategy`] which associates
//! them with the objects registered so far. The identities and histories live in [`TrackedObjects`].

mod bounding_box;
mod config;
mod detection;
mod detector;
mod error;
pub mod filters;
mod geometry;
mod matching;
mod sequence;
mod tracked_object;
mod tracked_objects;
mod tracker;
mod trackers;

pub use bounding_box::BoundingBox;
pub use config::{
    Assignment, CandidateOrder, ConflictPolicy, DistanceTolerance, ToleranceFn, TrackerConfig,
};
pub use detection::Detection;
pub use detector::{DetectionSource, ObjectDetector};
pub use error::{Result, TrackingError};
pub use filters::{DetectionFilter, FilterChain};
pub use geometry::{euclidean_norm, find_closest_position_to_line, point_distance_to_line, Point};
pub use matching::{distance_matrix, min_distance_matching, Match};
pub use sequence::{Sequence, SequenceInfo};
pub use tracked_object::{ObjectDetection, TrackStatus, TrackedDetection, TrackedObject};
pub use tracked_objects::{PurgedObject, TrackedObjects};
pub use tracker::{FrameSummary, MatchingStrategy, ObjectTracker, ProgressFn, TrackerState};
pub use trackers::{
    CentroidTracker, PointTracker, RegistrationMask, DEFAULT_MAX_DISTANCE, DEFAULT_TOLERANCE_FACTOR,
};
