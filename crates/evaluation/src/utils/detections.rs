use anyhow::{bail, Context, Result};
use centroid_tracking::{BoundingBox, Detection};
use indexmap::IndexMap;
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};

/// One row of a detections file: `frame,bb_left,bb_top,bb_width,bb_height,score,label`, frames are 0-based.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectionRecord {
    pub frame: usize,
    pub bb_left: f32,
    pub bb_top: f32,
    pub bb_width: f32,
    pub bb_height: f32,
    pub score: f32,
    pub label: String,
}

impl DetectionRecord {
    pub fn to_detection(&self) -> Detection {
        Detection::new(
            None,
            BoundingBox::new(self.bb_left, self.bb_top, self.bb_width, self.bb_height),
            self.score,
            self.label.as_str(),
        )
    }
}

pub fn read_records<R: Read>(reader: R, has_headers: bool) -> Result<Vec<DetectionRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .trim(csv::Trim::All)
        .from_reader(reader);
    reader
        .deserialize()
        .enumerate()
        .map(|(index, record)| record.with_context(|| format!("invalid detection record {}", index + 1)))
        .collect()
}

pub fn read_records_from_path(path: &Path, has_headers: bool) -> Result<Vec<DetectionRecord>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_records(file, has_headers)
}

/// Longest sequence a detections file may describe.
pub const MAX_FRAMES: usize = 10_000_000;

/// Groups the records by frame into one detection list per frame of a sequence of `frames` frames.
///
/// Without `frames` the sequence ends with the last frame holding a detection.
pub fn group_by_frame(records: &[DetectionRecord], frames: Option<usize>) -> Result<Vec<Vec<Detection>>> {
    let mut frame_results = IndexMap::<usize, Vec<Detection>>::new();
    records.iter().for_each(|record| {
        frame_results
            .entry(record.frame)
            .or_insert_with(Vec::new)
            .push(record.to_detection());
    });

    let last_frame = frame_results.keys().max().copied();
    let frames = match (frames, last_frame) {
        (Some(frames), Some(last_frame)) if last_frame >= frames => {
            bail!("detections found at frame {last_frame} in a sequence of {frames} frames")
        }
        (Some(frames), _) => frames,
        (None, Some(last_frame)) => match last_frame.checked_add(1) {
            Some(frames) => frames,
            None => bail!("frame {last_frame} is out of range"),
        },
        (None, None) => 0,
    };
    if frames > MAX_FRAMES {
        bail!("sequence of {frames} frames exceeds the maximum of {MAX_FRAMES}");
    }

    let mut detections = vec![Vec::new(); frames];
    for (frame, frame_detections) in frame_results {
        detections[frame] = frame_detections;
    }
    Ok(detections)
}
