use crate::*;
use tracing::trace;

/// Default maximum matching distance in pixels.
pub const DEFAULT_MAX_DISTANCE: f32 = 120.0;

/// Default factor of the largest frame dimension used as matching tolerance.
pub const DEFAULT_TOLERANCE_FACTOR: f32 = 0.05;

/// Tracks objects by matching each detection with the nearest registered centroid.
#[derive(Debug, Clone, Default)]
pub struct CentroidTracker {
    tolerance: DistanceTolerance,
    assignment: Assignment,
}

impl CentroidTracker {
    /// Returns a new CentroidTracker with a tolerance of `max_distance` pixels
    pub fn new(max_distance: f32) -> CentroidTracker {
        CentroidTracker {
            tolerance: DistanceTolerance::Fixed(max_distance),
            assignment: Assignment::default(),
        }
    }

    /// Returns a new CentroidTracker with a tolerance of `factor` times the largest frame dimension
    pub fn scaled(factor: f32) -> CentroidTracker {
        CentroidTracker {
            tolerance: DistanceTolerance::Scaled(factor),
            assignment: Assignment::default(),
        }
    }

    /// Set assignment
    pub fn with_assignment(&mut self, assignment: Assignment) -> &mut Self {
        self.assignment = assignment;
        self
    }

    /// Set tolerance
    pub fn with_tolerance(&mut self, tolerance: DistanceTolerance) -> &mut Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> &DistanceTolerance {
        &self.tolerance
    }

    pub fn assignment(&self) -> Assignment {
        self.assignment
    }
}

impl MatchingStrategy for CentroidTracker {
    fn match_objects(
        &mut self,
        info: &SequenceInfo,
        frame: usize,
        registered: &[ObjectDetection<'_>],
        candidates: &[Detection],
    ) -> Vec<Match> {
        let max_distance = self.tolerance.resolve(info);
        let matches = min_distance_matching(self.assignment, max_distance, registered, candidates);
        trace!(
            frame,
            max_distance,
            registered = registered.len(),
            candidates = candidates.len(),
            matches = matches.len(),
            "centroid matching"
        );
        matches
    }

    fn validate(&self, _info: &SequenceInfo) -> Result<()> {
        self.tolerance.validate()
    }
}
