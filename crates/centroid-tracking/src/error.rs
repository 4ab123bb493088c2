use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackingError>;

/// Errors raised while configuring or running a tracker.
///
/// Configuration errors are returned before any frame is processed. Contract violations are returned
/// as soon as they happen and abort the run.
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("an object detector or a list of precomputed detections must be provided")]
    MissingDetectionSource,

    #[error("the sequence has {frames} frames but detections were provided for {detections}")]
    DetectionsLengthMismatch { frames: usize, detections: usize },

    #[error("the sequence has {frames} frames but {timestamps} timestamps")]
    TimestampsLengthMismatch { frames: usize, timestamps: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("the object {0} is not registered")]
    UnknownObject(usize),

    #[error("the object {0} was unregistered and can't be updated")]
    AlreadyUnregistered(usize),

    #[error("the object {id} was last seen at frame {last_frame} and can't be updated at frame {frame}")]
    FrameOutOfOrder {
        id: usize,
        frame: usize,
        last_frame: usize,
    },

    #[error("invalid match of object {id} with detection {detection_index} at frame {frame}: {reason}")]
    InvalidMatch {
        id: usize,
        detection_index: usize,
        frame: usize,
        reason: &'static str,
    },

    #[error("frame {frame} is out of range for a sequence of {frames} frames")]
    FrameOutOfRange { frame: usize, frames: usize },

    #[error("object detector failed at frame {frame}")]
    Detector {
        frame: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl TrackingError {
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
