use serde_json::{json, Value};

/// Field mapping for the places index.
///
/// `avg_rating` and `rating_count` are not written by the harvest; the
/// review service fills them in later against the same documents.
pub fn places_mapping() -> Value {
    json!({
        "properties": {
            "name": { "type": "text" },
            "category": { "type": "keyword" },
            "address": { "type": "text" },
            "location": { "type": "geo_point" },
            "avg_rating": { "type": "float" },
            "rating_count": { "type": "integer" },
            "tags": { "type": "keyword" },
            "created_at": { "type": "date" },
            "updated_at": { "type": "date" }
        }
    })
}
