//! Place data model for Placewalk
//!
//! This module owns the shapes data takes on its way through the pipeline:
//! raw geodata elements as fetched, canonical place records as indexed, the
//! normalization between them, and the de-duplicating accumulator.

mod dedupe;
mod element;
mod normalize;
mod record;

pub use dedupe::PlaceStore;
pub use element::{Coordinates, ElementKind, OverpassEnvelope, RawElement};
pub use normalize::normalize;
pub use record::{Category, PlaceRecord};
