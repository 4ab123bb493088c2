//! Matching strategies for [`crate::ObjectTracker`].

mod centroid;
mod point;

pub use centroid::*;
pub use point::*;
