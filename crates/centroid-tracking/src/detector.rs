use crate::*;

/// An external object detector producing the detections of a single frame.
pub trait ObjectDetector<F> {
    fn detect(&mut self, frame: &F) -> anyhow::Result<Vec<Detection>>;
}

impl<F, T> ObjectDetector<F> for T
where
    T: FnMut(&F) -> anyhow::Result<Vec<Detection>>,
{
    fn detect(&mut self, frame: &F) -> anyhow::Result<Vec<Detection>> {
        (self)(frame)
    }
}

/// Where the tracker gets the detections of each frame from.
pub enum DetectionSource<F> {
    /// Detections are computed on demand for each frame.
    Detector(Box<dyn ObjectDetector<F>>),
    /// Detections were computed beforehand, one list per frame.
    Precomputed(Vec<Vec<Detection>>),
}

impl<F> std::fmt::Debug for DetectionSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionSource::Detector(_) => f.write_str("Detector"),
            DetectionSource::Precomputed(detections) => f
                .debug_tuple("Precomputed")
                .field(&detections.len())
                .finish(),
        }
    }
}

impl<F> DetectionSource<F> {
    /// Picks the detection source. Precomputed detections win when both are given.
    ///
    /// Fails if neither is provided, or if the precomputed detections do not cover exactly `frames` frames.
    pub fn resolve(
        detector: Option<Box<dyn ObjectDetector<F>>>,
        detections: Option<Vec<Vec<Detection>>>,
        frames: usize,
    ) -> Result<DetectionSource<F>> {
        match (detections, detector) {
            (Some(detections), _) => {
                if detections.len() != frames {
                    return Err(TrackingError::DetectionsLengthMismatch {
                        frames,
                        detections: detections.len(),
                    });
                }
                Ok(DetectionSource::Precomputed(detections))
            }
            (None, Some(detector)) => Ok(DetectionSource::Detector(detector)),
            (None, None) => Err(TrackingError::MissingDetectionSource),
        }
    }

    /// Returns the raw detections of frame `index`.
    pub(crate) fn detections(&mut self, sequence: &Sequence<F>, index: usize) -> Result<Vec<Detection>> {
        match self {
            DetectionSource::Precomputed(detections) => detections
                .get(index)
                .cloned()
                .ok_or(TrackingError::FrameOutOfRange {
                    frame: index,
                    frames: detections.len(),
                }),
            DetectionSource::Detector(detector) => detector
                .detect(sequence.frame(index)?)
                .map_err(|source| TrackingError::Detector {
                    frame: index,
                    source,
                }),
        }
    }
}
