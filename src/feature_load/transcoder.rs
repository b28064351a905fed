use geojson::FeatureCollection;
use serde_json::Value;
use tracing::warn;

/// Name used when the configured property is missing from a feature.
pub const DEFAULT_NAME: &str = "Unknown";

/// One feature reduced to the two values the insert statement takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRow {
    pub name: String,
    /// Geometry as canonical GeoJSON text. The database parses it under the
    /// source SRID and reprojects at insert time.
    pub geometry: String,
}

/// Flatten a collection into insertable rows, preserving input order.
/// Features without geometry are logged and dropped; a missing or
/// non-string name property falls back to [`DEFAULT_NAME`].
pub fn transcode(collection: &FeatureCollection, name_property: &str) -> Vec<FeatureRow> {
    let mut rows = Vec::with_capacity(collection.features.len());
    for feature in &collection.features {
        let name = feature
            .properties
            .as_ref()
            .and_then(|properties| properties.get(name_property))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_NAME)
            .to_string();

        let Some(geometry) = &feature.geometry else {
            warn!(name = %name, "feature has no geometry, skipping");
            continue;
        };

        rows.push(FeatureRow {
            name,
            geometry: geometry.to_string(),
        });
    }
    rows
}
