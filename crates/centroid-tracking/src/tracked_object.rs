use crate::*;
use std::{collections::VecDeque, fmt, ops::Index};

/// Lifecycle of a tracked object.
///
/// - Objects are `Active` from registration and take part in matching.
/// - An object that has not been seen for too long becomes `Unregistered`. This is terminal: it is never
///   matched or updated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    Active,
    Unregistered,
}

/// One entry of an object history: the detection matched to the object at `frame`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedDetection {
    pub frame: usize,
    pub detection: Detection,
}

/// A borrowed view of one observation of a tracked object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectDetection<'a> {
    pub id: usize,
    pub frame: usize,
    pub detection: &'a Detection,
}

/// The identity and history of one entity tracked across a sequence.
#[derive(Clone)]
pub struct TrackedObject {
    /// Identifier, equal to the index of the object in its registry.
    id: usize,
    status: TrackStatus,
    /// Observations ordered by strictly increasing frame.
    history: VecDeque<TrackedDetection>,
    /// Total number of detections ever appended, including the ones dropped by the history cap.
    hits: usize,
}

impl fmt::Debug for TrackedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedObject")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("hits", &self.hits)
            .field("first_frame", &self.first_frame())
            .field("last_frame", &self.last_frame())
            .finish()
    }
}

impl fmt::Display for TrackedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrackedObject(id={}, status={:?}, detections={})",
            self.id, self.status, self.hits
        )
    }
}

impl Index<usize> for TrackedObject {
    type Output = TrackedDetection;

    fn index(&self, index: usize) -> &Self::Output {
        &self.history[index]
    }
}

impl TrackedObject {
    pub(crate) fn new(id: usize, frame: usize, detection: Detection) -> TrackedObject {
        TrackedObject {
            id,
            status: TrackStatus::Active,
            history: VecDeque::from(vec![TrackedDetection { frame, detection }]),
            hits: 1,
        }
    }

    /// Return the identifier of the object
    pub fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, TrackStatus::Active)
    }

    pub fn is_unregistered(&self) -> bool {
        matches!(self.status, TrackStatus::Unregistered)
    }

    pub(crate) fn unregister(&mut self) {
        self.status = TrackStatus::Unregistered;
    }

    /// Number of retained history entries.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Always false, the history holds the registration detection at least.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Number of times the object was detected.
    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn history(&self) -> impl Iterator<Item = &TrackedDetection> {
        self.history.iter()
    }

    pub fn first(&self) -> &TrackedDetection {
        &self.history[0]
    }

    pub fn last(&self) -> &TrackedDetection {
        &self.history[self.history.len() - 1]
    }

    pub fn first_frame(&self) -> usize {
        self.first().frame
    }

    /// Frame in which the object was last seen.
    pub fn last_frame(&self) -> usize {
        self.last().frame
    }

    /// Appends an observation, dropping the oldest entries beyond `max_history`.
    pub(crate) fn append(
        &mut self,
        frame: usize,
        detection: Detection,
        max_history: Option<usize>,
    ) -> Result<()> {
        if self.is_unregistered() {
            return Err(TrackingError::AlreadyUnregistered(self.id));
        }
        let last_frame = self.last_frame();
        if frame <= last_frame {
            return Err(TrackingError::FrameOutOfOrder {
                id: self.id,
                frame,
                last_frame,
            });
        }

        self.history.push_back(TrackedDetection { frame, detection });
        self.hits += 1;
        if let Some(max_history) = max_history {
            while self.history.len() > max_history.max(1) {
                self.history.pop_front();
            }
        }
        Ok(())
    }

    /// Finds the detection of the object at `frame`.
    pub fn find_in_frame(&self, frame: usize) -> Option<ObjectDetection<'_>> {
        self.history
            .iter()
            .find(|entry| entry.frame == frame)
            .map(|entry| ObjectDetection {
                id: self.id,
                frame: entry.frame,
                detection: &entry.detection,
            })
    }

    /// Returns the last observation of the object.
    pub fn last_seen(&self) -> ObjectDetection<'_> {
        let last = self.last();
        ObjectDetection {
            id: self.id,
            frame: last.frame,
            detection: &last.detection,
        }
    }

    /// Position of the object in each frame of a sequence of `frame_count` frames: the detection center where the
    /// object was seen, `None` elsewhere. Missing positions are not interpolated.
    pub fn positions_in_sequence(&self, frame_count: usize) -> Vec<Option<Point>> {
        let mut positions = vec![None; frame_count];
        self.history
            .iter()
            .filter(|entry| entry.frame < frame_count)
            .for_each(|entry| positions[entry.frame] = Some(entry.detection.center()));
        positions
    }

    /// Like [`TrackedObject::positions_in_sequence`] but keyed by the timestamp of each frame.
    pub fn positions_in_time(&self, timestamps: &[u64]) -> Vec<(u64, Option<Point>)> {
        timestamps
            .iter()
            .copied()
            .zip(self.positions_in_sequence(timestamps.len()))
            .collect()
    }
}
