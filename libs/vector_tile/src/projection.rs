//! Projection of a decoded tile into a generic JSON tree.

use serde_json::{json, Map, Value};

use crate::{
    error::Error,
    tile::{Feature, Tile},
};

/// Builds `{ <layer name>: { "features": [...] } }` in layer order. A layer whose name was
/// already seen replaces the earlier entry.
pub fn project(tile: &Tile) -> Result<Value, Error> {
    let mut layers = Map::new();

    for layer in tile.layers() {
        let features = layer
            .features()
            .iter()
            .map(project_feature)
            .collect::<Result<Vec<_>, _>>()?;

        if layers
            .insert(layer.name().to_owned(), json!({ "features": features }))
            .is_some()
        {
            log::debug!("layer {} replaces an earlier layer of the same name", layer.name());
        }
    }

    Ok(Value::Object(layers))
}

fn project_feature(feature: &Feature) -> Result<Value, Error> {
    Ok(json!({
        "type": "Feature",
        "geometry": serde_json::to_value(feature.geometry())?,
        "properties": serde_json::to_value(feature.properties())?,
    }))
}
