use crate::grid::BoundingBox;
use std::time::Duration;

/// `amenity` tag values the crawl matches.
pub const AMENITY_FILTERS: [&str; 6] = [
    "cafe",
    "restaurant",
    "fast_food",
    "convenience",
    "hairdresser",
    "beauty",
];

/// `shop` tag values the crawl matches.
pub const SHOP_FILTERS: [&str; 6] = [
    "convenience",
    "supermarket",
    "bakery",
    "department_store",
    "hairdresser",
    "beauty",
];

/// Builds the Overpass QL query for one bounding box.
///
/// Requests all three element kinds for both filter sets, with `out center`
/// so ways and relations come back with a representative point. The embedded
/// `timeout:` mirrors the client-side deadline; without it the server may
/// truncate results silently instead of failing in a detectable way.
pub fn build_query(bbox: &BoundingBox, timeout: Duration) -> String {
    let amenity = AMENITY_FILTERS.join("|");
    let shop = SHOP_FILTERS.join("|");
    let BoundingBox {
        south,
        west,
        north,
        east,
    } = *bbox;

    format!(
        "[out:json][timeout:{timeout}];(\n\
         node[\"amenity\"~\"{amenity}\"]({south},{west},{north},{east});\n\
         way[\"amenity\"~\"{amenity}\"]({south},{west},{north},{east});\n\
         relation[\"amenity\"~\"{amenity}\"]({south},{west},{north},{east});\n\
         node[\"shop\"~\"{shop}\"]({south},{west},{north},{east});\n\
         way[\"shop\"~\"{shop}\"]({south},{west},{north},{east});\n\
         relation[\"shop\"~\"{shop}\"]({south},{west},{north},{east});\n\
         );out center;",
        timeout = timeout.as_secs(),
    )
}
