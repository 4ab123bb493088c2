mod utils;
use anyhow::{Context, Result};
use centroid_tracking::{
    Assignment, BoundingBox, CandidateOrder, CentroidTracker, ConflictPolicy, Detection,
    MatchingStrategy, ObjectTracker, PointTracker, RegistrationMask, Sequence, SequenceInfo,
    TrackedObjects, TrackerConfig,
};
use clap::{Parser, ValueEnum};
use std::{fs::File, path::PathBuf};
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;
use utils::*;

/// Tracks precomputed detections and writes the tracks in the MOT challenge format
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The detections file: frame,bb_left,bb_top,bb_width,bb_height,score,label
    #[arg(short, long)]
    input: PathBuf,

    /// The tracker output file
    #[arg(short, long)]
    output: PathBuf,

    /// Whether the detections file starts with a header row
    #[arg(long, default_value_t = false)]
    has_headers: bool,

    /// The frame width
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// The frame height
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// The frame rate
    #[arg(long, default_value_t = 30.0)]
    fps: f32,

    /// The number of frames of the sequence, defaults to the last frame with detections
    #[arg(long)]
    frames: Option<usize>,

    /// The matching strategy
    #[arg(long, value_enum, default_value_t = Strategy::Centroid)]
    strategy: Strategy,

    /// The maximum matching distance in pixels, overrides the tolerance factor
    #[arg(long)]
    max_distance: Option<f32>,

    /// The maximum matching distance as a factor of the largest frame dimension
    #[arg(long, default_value_t = centroid_tracking::DEFAULT_TOLERANCE_FACTOR)]
    tolerance_factor: f32,

    /// The assignment algorithm
    #[arg(long, value_enum, default_value_t = AssignmentKind::Greedy)]
    assignment: AssignmentKind,

    /// Tracker configuration JSON file, the options below override it
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// The minimum score of the detections tracked
    #[arg(long)]
    min_score: Option<f32>,

    /// The labels of the detections tracked, comma separated
    #[arg(long, value_delimiter = ',')]
    classes: Vec<String>,

    /// Suppress overlapping detections of the same object
    #[arg(long, default_value_t = false)]
    avoid_duplicated: bool,

    /// The number of frames an object can be missing before it is unregistered
    #[arg(long)]
    frames_to_unregister: Option<usize>,

    /// Drop the objects detected fewer times than this
    #[arg(long, default_value_t = 1)]
    min_detections: usize,

    /// Point strategy registration region: left,top,width,height
    #[arg(long, value_parser = parse_region)]
    registration_region: Option<BoundingBox>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    Centroid,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AssignmentKind {
    /// Nearest centroid, higher scores first, conflicts take the next closest object
    Greedy,
    /// Nearest centroid in detection order, conflicts stay unmatched
    GreedyLegacy,
    /// Minimum total distance
    Optimal,
}

impl From<AssignmentKind> for Assignment {
    fn from(kind: AssignmentKind) -> Self {
        match kind {
            AssignmentKind::Greedy => Assignment::default(),
            AssignmentKind::GreedyLegacy => Assignment::Greedy {
                order: CandidateOrder::DetectionOrder,
                conflict: ConflictPolicy::SkipCandidate,
            },
            AssignmentKind::Optimal => Assignment::Optimal,
        }
    }
}

fn parse_region(region: &str) -> Result<BoundingBox> {
    let values = region
        .split(',')
        .map(|value| value.trim().parse::<f32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("region values must be numbers")?;
    match values[..] {
        [left, top, width, height] => Ok(BoundingBox::new(left, top, width, height)),
        _ => anyhow::bail!("region must be left,top,width,height"),
    }
}

fn load_config(args: &Args) -> Result<TrackerConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            serde_json::from_reader(file).with_context(|| format!("invalid configuration {}", path.display()))?
        }
        None => TrackerConfig::default(),
    };

    if let Some(min_score) = args.min_score {
        config.with_min_score(min_score);
    }
    if !args.classes.is_empty() {
        config.with_classes(args.classes.iter().cloned());
    }
    if args.avoid_duplicated {
        config.with_avoid_duplicated(true);
    }
    if let Some(frames) = args.frames_to_unregister {
        config.with_frames_to_unregister(frames);
    }
    Ok(config)
}

fn track<S: MatchingStrategy>(
    sequence: Sequence,
    detections: Vec<Vec<Detection>>,
    strategy: S,
    config: &TrackerConfig,
) -> Result<TrackedObjects> {
    let mut tracker = ObjectTracker::with_precomputed(sequence, detections, strategy, config)?;
    tracker.with_progress(|frame, frames| {
        if (frame + 1) % 100 == 0 || frame + 1 == frames {
            debug!("processed {}/{} frames", frame + 1, frames);
        }
    });
    tracker.run()?;
    Ok(tracker.into_tracked_objects())
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(false)
        .init();

    let config = load_config(&args)?;

    let records = detections::read_records_from_path(&args.input, args.has_headers)?;
    let detections = detections::group_by_frame(&records, args.frames)?;
    info!(
        "read {} detections over {} frames from {}",
        records.len(),
        detections.len(),
        args.input.display()
    );

    let info = SequenceInfo::new(args.width, args.height, args.fps);
    let sequence = Sequence::blank(info, detections.len());

    let mut matcher = match args.max_distance {
        Some(max_distance) => CentroidTracker::new(max_distance),
        None => CentroidTracker::scaled(args.tolerance_factor),
    };
    matcher.with_assignment(args.assignment.into());

    let mut objects = match args.strategy {
        Strategy::Centroid => track(sequence, detections, matcher, &config)?,
        Strategy::Point => {
            let mask = match &args.registration_region {
                Some(region) => RegistrationMask::rectangle(args.width, args.height, region),
                None => RegistrationMask::full(args.width, args.height),
            };
            track(sequence, detections, PointTracker::new(matcher, mask), &config)?
        }
    };
    info!("{}", objects);

    let purged = objects.purge_by_min_detections(args.min_detections);
    if !purged.is_empty() {
        info!(
            "dropped {} objects detected fewer than {} times",
            purged.len(),
            args.min_detections
        );
    }

    let rows = mot::write_mot_to_path(&args.output, &objects)?;
    info!(
        "wrote {} rows for {} objects to {}",
        rows,
        objects.len(),
        args.output.display()
    );

    Ok(())
}
