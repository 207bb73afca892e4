use crate::ConfigError;
use std::fmt;

/// A rectangular crawl region in degree coordinates.
///
/// Invariant: `south < north` and `west < east`. Boxes are immutable once
/// constructed; the partitioner and config parser are the only producers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Constructs a box, rejecting non-finite coordinates and inverted edges.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, ConfigError> {
        if ![south, west, north, east].iter().all(|v| v.is_finite()) {
            return Err(ConfigError::Validation(format!(
                "bounding box has non-finite coordinates: {south},{west},{north},{east}"
            )));
        }
        if south >= north || west >= east {
            return Err(ConfigError::Validation(format!(
                "bounding box requires south < north and west < east, got {south},{west},{north},{east}"
            )));
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "south={} west={} north={} east={}",
            self.south, self.west, self.north, self.east
        )
    }
}

/// Parses a `;`-separated list of `south,west,north,east` quadruples.
///
/// Malformed quadruples (wrong arity, unparsable or non-finite numbers,
/// inverted edges) are dropped individually with a warning; they never fail
/// the whole list.
pub fn parse_bbox_list(raw: &str) -> Vec<BoundingBox> {
    raw.split(';')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .filter_map(|chunk| {
            let parts: Result<Vec<f64>, _> = chunk
                .split(',')
                .map(|v| v.trim().parse::<f64>())
                .collect();
            let parts = match parts {
                Ok(parts) if parts.len() == 4 => parts,
                Ok(parts) => {
                    tracing::warn!(
                        "discarding bounding box '{}': expected 4 values, got {}",
                        chunk,
                        parts.len()
                    );
                    return None;
                }
                Err(e) => {
                    tracing::warn!("discarding bounding box '{}': {}", chunk, e);
                    return None;
                }
            };

            match BoundingBox::new(parts[0], parts[1], parts[2], parts[3]) {
                Ok(bbox) => Some(bbox),
                Err(e) => {
                    tracing::warn!("discarding bounding box '{}': {}", chunk, e);
                    None
                }
            }
        })
        .collect()
}
