use crate::*;
use serde::{Deserialize, Serialize};

/// Metadata of a frame sequence. Only used to scale the matching tolerance and for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
}

impl SequenceInfo {
    pub fn new(width: u32, height: u32, fps: f32) -> SequenceInfo {
        SequenceInfo { width, height, fps }
    }
}

/// A sequence of frames with its metadata.
///
/// Frames are opaque to the tracker and only handed to an [`ObjectDetector`]. Sequences tracked from
/// precomputed detections can use `()` frames, see [`Sequence::blank`].
#[derive(Debug, Clone)]
pub struct Sequence<F = ()> {
    info: SequenceInfo,
    frames: Vec<F>,
    /// Optional timestamp of each frame.
    timestamps: Option<Vec<u64>>,
}

impl<F> Sequence<F> {
    pub fn new(info: SequenceInfo, frames: Vec<F>) -> Sequence<F> {
        Sequence {
            info,
            frames,
            timestamps: None,
        }
    }

    /// Attaches one timestamp per frame.
    pub fn with_timestamps(mut self, timestamps: Vec<u64>) -> Result<Sequence<F>> {
        if timestamps.len() != self.frames.len() {
            return Err(TrackingError::TimestampsLengthMismatch {
                frames: self.frames.len(),
                timestamps: timestamps.len(),
            });
        }
        self.timestamps = Some(timestamps);
        Ok(self)
    }

    pub fn info(&self) -> &SequenceInfo {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Result<&F> {
        self.frames.get(index).ok_or(TrackingError::FrameOutOfRange {
            frame: index,
            frames: self.frames.len(),
        })
    }

    pub fn timestamps(&self) -> Option<&[u64]> {
        self.timestamps.as_deref()
    }
}

impl Sequence<()> {
    /// A sequence of `len` frames without image content.
    pub fn blank(info: SequenceInfo, len: usize) -> Sequence<()> {
        Sequence::new(info, vec![(); len])
    }
}
