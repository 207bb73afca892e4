use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The JSON envelope returned by the Overpass API.
///
/// A missing `elements` array deserializes to an empty list.
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassEnvelope {
    #[serde(default)]
    pub elements: Vec<RawElement>,
}

/// OSM element kinds the geodata API can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A raw element exactly as the geodata API serves it.
///
/// Nodes carry direct `lat`/`lon`; ways and relations carry a representative
/// `center` point when the query requests one. Lives only for the duration of
/// a single fetch response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawElement {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub id: i64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub center: Option<Coordinates>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl RawElement {
    /// Deterministic per-element identity, globally unique per raw element.
    pub fn source_id(&self) -> String {
        format!("{}-{}", self.kind, self.id)
    }
}
