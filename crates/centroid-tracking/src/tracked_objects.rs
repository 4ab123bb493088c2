use crate::*;
use std::{fmt, ops::Index};
use tracing::{debug, trace};

/// An object removed by a purge, identified by the id it had before the compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgedObject {
    pub id: usize,
    pub detections: usize,
}

/// The registry of every object tracked in a sequence, active or unregistered.
///
/// Objects are stored in an arena indexed by their id: ids are dense, `0..len()`, and `len()` equals the
/// next id to be assigned. Only [`TrackedObjects::purge`] changes existing ids, shifting the survivors
/// down to keep them contiguous.
#[derive(Debug, Clone, Default)]
pub struct TrackedObjects {
    /// Used to allocate identifiers to new objects.
    next_id: usize,
    objects: Vec<TrackedObject>,
    /// If not None, the number of history entries retained per object.
    max_history: Option<usize>,
}

impl fmt::Display for TrackedObjects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrackedObjects({} objects registered, {} active)",
            self.len(),
            self.objects.iter().filter(|object| object.is_active()).count()
        )
    }
}

impl Index<usize> for TrackedObjects {
    type Output = TrackedObject;

    fn index(&self, id: usize) -> &Self::Output {
        &self.objects[id]
    }
}

impl TrackedObjects {
    pub fn new() -> TrackedObjects {
        TrackedObjects::default()
    }

    /// Set max_history
    pub fn with_max_history(&mut self, max_history: Option<usize>) -> &mut Self {
        self.max_history = max_history;
        self
    }

    /// Number of objects stored, both active and unregistered.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The identifier the next registered object will receive.
    pub fn next_id(&self) -> usize {
        self.next_id
    }

    pub fn get(&self, id: usize) -> Option<&TrackedObject> {
        self.objects.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.iter()
    }

    /// Registers a new active object first seen at `frame` and returns its id.
    pub fn register(&mut self, detection: Detection, frame: usize) -> usize {
        let id = self.next_id;
        trace!(id, frame, center = %detection.center(), "register object");
        self.objects.push(TrackedObject::new(id, frame, detection));
        self.next_id += 1;
        id
    }

    /// Appends the observation of object `id` at `frame`.
    ///
    /// Fails if the object does not exist, was unregistered, or was already seen at or after `frame`.
    pub fn update(&mut self, detection: Detection, id: usize, frame: usize) -> Result<()> {
        let max_history = self.max_history;
        let object = self
            .objects
            .get_mut(id)
            .ok_or(TrackingError::UnknownObject(id))?;
        trace!(id, frame, center = %detection.center(), "update object");
        object.append(frame, detection, max_history)
    }

    /// Unregisters the active objects that have been missing for more than `max_frames_missing` frames.
    pub fn unregister_missing(&mut self, frame: usize, max_frames_missing: usize) {
        self.objects
            .iter_mut()
            .filter(|object| object.is_active())
            .filter(|object| frame.saturating_sub(object.last_frame()) > max_frames_missing)
            .for_each(|object| {
                debug!(
                    id = object.id(),
                    frame,
                    last_frame = object.last_frame(),
                    "unregister missing object"
                );
                object.unregister();
            });
    }

    /// Returns the objects seen at exactly `frame`, whatever their current status.
    pub fn active_at(&self, frame: usize) -> Vec<ObjectDetection<'_>> {
        self.objects
            .iter()
            .filter_map(|object| object.find_in_frame(frame))
            .collect()
    }

    /// Returns the last observation of every active object. This is the matching candidate pool.
    pub fn registered(&self) -> Vec<ObjectDetection<'_>> {
        self.objects
            .iter()
            .filter(|object| object.is_active())
            .map(|object| object.last_seen())
            .collect()
    }

    /// Finds the detection of object `id` at `frame`.
    pub fn find_in_frame(&self, id: usize, frame: usize) -> Result<Option<ObjectDetection<'_>>> {
        Ok(self
            .objects
            .get(id)
            .ok_or(TrackingError::UnknownObject(id))?
            .find_in_frame(frame))
    }

    /// Positions of object `id` along a sequence of `frame_count` frames.
    pub fn positions(&self, id: usize, frame_count: usize) -> Result<Vec<Option<Point>>> {
        Ok(self
            .objects
            .get(id)
            .ok_or(TrackingError::UnknownObject(id))?
            .positions_in_sequence(frame_count))
    }

    /// Removes the objects in `ids` and renumbers the remaining ones to keep ids contiguous.
    ///
    /// Each survivor's id decreases by the number of removed objects with a smaller id. Unknown and repeated
    /// ids are ignored.
    pub fn purge(&mut self, ids: &[usize]) -> Vec<PurgedObject> {
        let mut removed = Vec::with_capacity(ids.len());
        let objects = std::mem::take(&mut self.objects);
        for object in objects {
            if ids.contains(&object.id()) {
                removed.push(PurgedObject {
                    id: object.id(),
                    detections: object.hits(),
                });
            } else {
                let mut object = object;
                object.set_id(self.objects.len());
                self.objects.push(object);
            }
        }
        self.next_id = self.objects.len();

        if !removed.is_empty() {
            debug!(
                removed = removed.len(),
                remaining = self.objects.len(),
                "purged objects"
            );
        }
        removed
    }

    /// Removes every object detected fewer than `min_detections` times. See [`TrackedObjects::purge`].
    pub fn purge_by_min_detections(&mut self, min_detections: usize) -> Vec<PurgedObject> {
        let ids = self
            .objects
            .iter()
            .filter(|object| object.hits() < min_detections)
            .map(|object| object.id())
            .collect::<Vec<_>>();
        self.purge(&ids)
    }
}
