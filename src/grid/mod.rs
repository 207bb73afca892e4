//! Grid partitioning module for Placewalk
//!
//! This module derives the set of bounding boxes a harvest run crawls:
//! explicit boxes from configuration, named region presets, or the
//! full-country default grid.

mod bbox;
mod region;

pub use bbox::{parse_bbox_list, BoundingBox};
pub use region::{default_grid, named_region, resolve_boxes};
