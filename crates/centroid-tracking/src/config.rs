use crate::{filters, FilterChain, Result, SequenceInfo, TrackingError};
use serde::{Deserialize, Serialize};
use std::{fmt, rc::Rc};
use tracing::debug;

/// Computes the maximum matching distance from the frame width, height and fps.
pub type ToleranceFn = Rc<dyn Fn(u32, u32, f32) -> f32>;

/// Maximum centroid distance allowed between a registered object and a candidate detection.
#[derive(Clone)]
pub enum DistanceTolerance {
    /// A distance in pixels.
    Fixed(f32),
    /// A factor of the largest frame dimension.
    Scaled(f32),
    Custom(ToleranceFn),
}

impl Default for DistanceTolerance {
    fn default() -> Self {
        DistanceTolerance::Scaled(0.05)
    }
}

impl fmt::Debug for DistanceTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceTolerance::Fixed(distance) => f.debug_tuple("Fixed").field(distance).finish(),
            DistanceTolerance::Scaled(factor) => f.debug_tuple("Scaled").field(factor).finish(),
            DistanceTolerance::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl DistanceTolerance {
    /// Returns the tolerance in pixels for a sequence.
    ///
    /// A custom function returning NaN or a negative distance resolves to zero, so only detections exactly on an
    /// object's centroid can match it.
    pub fn resolve(&self, info: &SequenceInfo) -> f32 {
        match self {
            DistanceTolerance::Fixed(distance) => *distance,
            DistanceTolerance::Scaled(factor) => info.width.max(info.height) as f32 * factor,
            DistanceTolerance::Custom(tolerance_fn) => {
                let tolerance = (tolerance_fn)(info.width, info.height, info.fps);
                if tolerance.is_nan() || tolerance < 0.0 {
                    debug!(tolerance, "custom distance tolerance out of range, using 0");
                    return 0.0;
                }
                tolerance
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            DistanceTolerance::Fixed(value) | DistanceTolerance::Scaled(value)
                if value.is_nan() || *value < 0.0 =>
            {
                Err(TrackingError::invalid_config(format!(
                    "distance tolerance must be a non-negative number, got {}",
                    value
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Order in which the candidate detections of a frame pick their match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrder {
    /// Higher-confidence detections choose first. Equal scores keep detection order.
    #[default]
    ScoreDescending,
    /// Detections choose in the order the detector returned them.
    DetectionOrder,
}

/// What a candidate does when the registered object nearest to it is already matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Matched objects are out of consideration, the candidate takes the nearest remaining one.
    #[default]
    NextClosest,
    /// The candidate stays unmatched.
    SkipCandidate,
}

/// How candidates are assigned to registered objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assignment {
    /// Single pass nearest-centroid assignment.
    Greedy {
        order: CandidateOrder,
        conflict: ConflictPolicy,
    },
    /// Kuhn-Munkres assignment over the gated distance matrix: as many matches as possible, then the minimum total
    /// distance.
    Optimal,
}

impl Default for Assignment {
    fn default() -> Self {
        Assignment::Greedy {
            order: CandidateOrder::default(),
            conflict: ConflictPolicy::default(),
        }
    }
}

/// Configuration of the tracking engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Minimum score of the detections kept.
    pub objects_min_score: Option<f32>,
    /// Labels of the detections kept.
    pub objects_classes: Option<Vec<String>>,
    /// Suppress multiple detections of the same object.
    pub objects_avoid_duplicated: bool,
    /// Intersection over union above which two detections are duplicates.
    pub duplicated_iou_threshold: f32,
    /// Number of frames an object can be missing before it is unregistered.
    pub frames_to_unregister_missing_objects: usize,
    /// If not None, the number of history entries retained per object.
    pub max_history: Option<usize>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            objects_min_score: None,
            objects_classes: None,
            objects_avoid_duplicated: false,
            duplicated_iou_threshold: 0.5,
            frames_to_unregister_missing_objects: 10,
            max_history: None,
        }
    }
}

impl TrackerConfig {
    /// Set objects_min_score
    pub fn with_min_score(&mut self, min_score: f32) -> &mut Self {
        self.objects_min_score = Some(min_score);
        self
    }

    /// Set objects_classes
    pub fn with_classes<S: Into<String>>(&mut self, classes: impl IntoIterator<Item = S>) -> &mut Self {
        self.objects_classes = Some(classes.into_iter().map(Into::into).collect());
        self
    }

    /// Set objects_avoid_duplicated
    pub fn with_avoid_duplicated(&mut self, avoid_duplicated: bool) -> &mut Self {
        self.objects_avoid_duplicated = avoid_duplicated;
        self
    }

    /// Set duplicated_iou_threshold
    pub fn with_duplicated_iou_threshold(&mut self, threshold: f32) -> &mut Self {
        self.duplicated_iou_threshold = threshold;
        self
    }

    /// Set frames_to_unregister_missing_objects
    pub fn with_frames_to_unregister(&mut self, frames: usize) -> &mut Self {
        self.frames_to_unregister_missing_objects = frames;
        self
    }

    /// Set max_history
    pub fn with_max_history(&mut self, max_history: Option<usize>) -> &mut Self {
        self.max_history = max_history;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(min_score) = self.objects_min_score {
            if min_score.is_nan() {
                return Err(TrackingError::invalid_config("minimum score is not a number"));
            }
        }
        if !(0.0..=1.0).contains(&self.duplicated_iou_threshold) {
            return Err(TrackingError::invalid_config(format!(
                "duplicated iou threshold must be in [0, 1], got {}",
                self.duplicated_iou_threshold
            )));
        }
        Ok(())
    }

    /// Builds the filter chain: minimum score, then classes, then duplicate suppression.
    pub fn filter_chain(&self) -> FilterChain {
        let mut chain = FilterChain::new();
        if let Some(min_score) = self.objects_min_score {
            chain.push("min_score", filters::min_score(min_score));
        }
        if let Some(classes) = &self.objects_classes {
            chain.push("classes", filters::classes(classes.clone()));
        }
        if self.objects_avoid_duplicated {
            chain.push(
                "avoid_duplicated",
                filters::avoid_duplicated(self.duplicated_iou_threshold),
            );
        }
        chain
    }
}
