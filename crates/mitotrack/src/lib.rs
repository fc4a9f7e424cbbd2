//! Frame-synchronous tracking and line-crossing counting of mitotic and
//! non-mitotic figures detected in a microscope slide scan video.
//!
//! The crate consumes per-frame detections from an external detector,
//! associates them into persistent tracks by intersection over union, and
//! counts each track exactly once when its centroid crosses a fixed vertical
//! reference line in the counted direction. Video decoding, inference and
//! persistence are collaborator concerns and live outside this crate.

mod bounding_box;
mod counting_line;
mod detection;
mod tally;
mod track;
mod tracker;

pub mod hpf;
pub mod iou_matching;

pub use bounding_box::BoundingBox;
pub use counting_line::{CountingLine, CrossingDirection};
pub use detection::Detection;
pub use tally::{ClassMap, CrossingEvent, FigureClass, Tally};
pub use track::Track;
pub use tracker::Tracker;
