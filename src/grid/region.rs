//! Region resolution: explicit boxes, named presets, or the default grid.

use crate::config::CrawlConfig;
use crate::grid::bbox::{parse_bbox_list, BoundingBox};

/// Latitude bands of the nationwide default grid (South Korea).
const LAT_BANDS: [(f64, f64); 6] = [
    (33.0, 34.0),
    (34.0, 35.0),
    (35.0, 36.0),
    (36.0, 37.0),
    (37.0, 38.0),
    (38.0, 38.8),
];

/// Longitude bands of the nationwide default grid.
const LON_BANDS: [(f64, f64); 7] = [
    (124.5, 125.5),
    (125.5, 126.5),
    (126.5, 127.5),
    (127.5, 128.5),
    (128.5, 129.5),
    (129.5, 130.5),
    (130.5, 131.5),
];

fn bx(south: f64, west: f64, north: f64, east: f64) -> BoundingBox {
    BoundingBox {
        south,
        west,
        north,
        east,
    }
}

/// The full-country grid: one box per (latitude band, longitude band) pair.
///
/// Cells are sized to keep individual queries within the public API's
/// practical result limits.
pub fn default_grid() -> Vec<BoundingBox> {
    LAT_BANDS
        .iter()
        .flat_map(|&(south, north)| {
            LON_BANDS
                .iter()
                .map(move |&(west, east)| bx(south, west, north, east))
        })
        .collect()
}

/// Looks up a named region preset (case-insensitive).
pub fn named_region(key: &str) -> Option<Vec<BoundingBox>> {
    let boxes = match key.to_lowercase().as_str() {
        "seoul" => vec![bx(37.3, 126.7, 37.75, 127.2)],
        "incheon" => vec![bx(37.3, 126.4, 37.6, 126.8)],
        "suwon" => vec![bx(37.2, 126.9, 37.35, 127.1)],
        "seongnam" => vec![bx(37.35, 127.0, 37.5, 127.2)],
        "busan" => vec![bx(35.0, 128.8, 35.4, 129.3)],
        "ulsan" => vec![bx(35.4, 129.1, 35.7, 129.5)],
        "changwon" => vec![bx(35.1, 128.5, 35.35, 128.8)],
        "daegu" => vec![bx(35.7, 128.3, 35.95, 128.75)],
        "daejeon" => vec![bx(36.22, 127.25, 36.45, 127.55)],
        "gwangju" => vec![bx(35.05, 126.75, 35.25, 127.05)],
        "jeonju" => vec![bx(35.78, 127.06, 35.92, 127.2)],
        "gyeongju" => vec![bx(35.7, 129.0, 36.0, 129.4)],
        "cheonan" => vec![bx(36.7, 127.1, 36.9, 127.3)],
        "asan" => vec![bx(36.7, 126.9, 36.95, 127.15)],
        "jeju" => vec![bx(33.2, 126.2, 33.6, 126.8)],
        _ => return None,
    };
    Some(boxes)
}

/// Produces the ordered sequence of boxes to crawl.
///
/// Precedence: explicit `bboxes` (when at least one quadruple survives
/// parsing), then a named `region` preset, then the default grid. Pure
/// function of the configuration; no network or index access.
pub fn resolve_boxes(config: &CrawlConfig) -> Vec<BoundingBox> {
    if let Some(raw) = &config.bboxes {
        let custom = parse_bbox_list(raw);
        if !custom.is_empty() {
            tracing::info!("using {} explicit bounding box(es)", custom.len());
            return custom;
        }
    }

    if let Some(region) = &config.region {
        if let Some(preset) = named_region(region) {
            tracing::info!("using region preset '{}' ({} box(es))", region, preset.len());
            return preset;
        }
        tracing::warn!(
            "unknown region preset '{}', falling back to the default grid",
            region
        );
    }

    default_grid()
}
