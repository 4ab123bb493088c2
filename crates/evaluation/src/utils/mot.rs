use anyhow::{Context, Result};
use centroid_tracking::TrackedObjects;
use itertools::Itertools;
use std::{fs::File, io::Write, path::Path};

/// Writes the tracked objects in the MOT challenge format, one row per detection ordered by frame then id.
///
/// <frame>, <id>, <bb_left>, <bb_top>, <bb_width>, <bb_height>, <conf>, <x>, <y>, <z>
///
/// Frames are written 1-based. Returns the number of rows written.
pub fn write_mot<W: Write>(writer: W, objects: &TrackedObjects) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    let rows = objects
        .iter()
        .flat_map(|object| object.history().map(move |entry| (entry.frame, object.id(), entry)))
        .sorted_by_key(|(frame, id, _)| (*frame, *id))
        .collect::<Vec<_>>();

    for (frame, id, entry) in &rows {
        let tlwh = entry.detection.bbox().to_tlwh();
        let record = [(frame + 1).to_string(), id.to_string()]
            .into_iter()
            .chain(tlwh.iter().map(|value| format!("{:.3}", value)))
            .chain([format!("{:.3}", entry.detection.score())])
            .chain(["-1", "-1", "-1"].map(String::from));
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(rows.len())
}

pub fn write_mot_to_path(path: &Path, objects: &TrackedObjects) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_mot(file, objects)
}
