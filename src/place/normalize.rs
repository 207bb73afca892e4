//! Raw element to place record normalization
//!
//! Rejection is an expected, high-volume outcome here (the crawl query is
//! broader than the category table), so it is modeled as `None` rather than
//! an error. Callers count rejections in aggregate.

use crate::place::element::{Coordinates, ElementKind, RawElement};
use crate::place::record::{Category, PlaceRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Name tag keys in preference order.
const NAME_KEYS: [&str; 4] = ["name", "name:ko", "name:en", "brand"];

/// Descriptive tag keys copied onto the record, in output order.
const DESCRIPTIVE_KEYS: [&str; 6] = [
    "cuisine",
    "brand",
    "takeaway",
    "delivery",
    "wheelchair",
    "payment",
];

/// Maps a raw element to a canonical place record.
///
/// Returns `None` when the element lacks a recognized category, a usable
/// name, or usable coordinates. Both timestamps are set to `now`; the crawl
/// does not distinguish creation from update.
pub fn normalize(element: &RawElement, now: DateTime<Utc>) -> Option<PlaceRecord> {
    let tags = &element.tags;

    let raw_category = tags
        .get("amenity")
        .filter(|v| !v.is_empty())
        .or_else(|| tags.get("shop").filter(|v| !v.is_empty()))?;
    let category = Category::from_tag(raw_category)?;

    let name = pick_name(tags)?;
    let location = resolve_location(element)?;

    Some(PlaceRecord {
        source_id: element.source_id(),
        name,
        category,
        address: build_address(tags),
        location,
        tags: pick_tags(tags),
        created_at: now,
        updated_at: now,
    })
}

/// First name candidate that is non-empty after trimming.
fn pick_name(tags: &HashMap<String, String>) -> Option<String> {
    NAME_KEYS
        .iter()
        .filter_map(|key| tags.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Nodes carry direct coordinates; ways and relations only a center point.
fn resolve_location(element: &RawElement) -> Option<Coordinates> {
    match element.kind {
        ElementKind::Node => match (element.lat, element.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => element.center,
        },
        ElementKind::Way | ElementKind::Relation => element.center,
    }
}

/// Space-joins whichever address fragments are present, in a fixed
/// preference order, dropping repeated fragments.
fn build_address(tags: &HashMap<String, String>) -> Option<String> {
    let street = match (tags.get("addr:street"), tags.get("addr:housenumber")) {
        (Some(street), Some(number)) => Some(format!("{street} {number}")),
        (Some(street), None) => Some(street.clone()),
        _ => None,
    };

    let candidates = [
        tags.get("addr:full").cloned(),
        tags.get("addr:city").cloned(),
        tags.get("addr:district").cloned(),
        tags.get("addr:suburb").cloned(),
        tags.get("addr:neighbourhood").cloned(),
        street,
        tags.get("addr:place").cloned(),
    ];

    let fragments = dedup_trimmed(candidates.into_iter().flatten());
    if fragments.is_empty() {
        None
    } else {
        Some(fragments.join(" "))
    }
}

/// Values of the descriptive allow-list, de-duplicated, order preserved.
fn pick_tags(tags: &HashMap<String, String>) -> Option<Vec<String>> {
    let values = dedup_trimmed(
        DESCRIPTIVE_KEYS
            .iter()
            .filter_map(|key| tags.get(*key))
            .cloned(),
    );
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn dedup_trimmed(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if !trimmed.is_empty() && !out.iter().any(|seen| seen == trimmed) {
            out.push(trimmed.to_string());
        }
    }
    out
}
