use indexmap::IndexMap;
use serde::{ser::Error as _, Serialize, Serializer};

use crate::geometry::Geometry;

/// Feature properties in tag order.
pub type Properties = IndexMap<String, PropertyValue>;

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    layers: Vec<Layer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    name: String,
    version: u32,
    features: Vec<Feature>,
    extent: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    id: Option<u64>,
    geometry: Geometry,
    properties: Properties,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    StringValue(String),
    FloatValue(f32),
    DoubleValue(f64),
    IntValue(i64),
    UIntValue(u64),
    SIntValue(i64),
    BoolValue(bool),
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyValue::StringValue(value) => serializer.serialize_str(value),
            // Widen through the shortest decimal form so 0.1f32 stays 0.1
            PropertyValue::FloatValue(value) => serialize_finite(
                serializer,
                value
                    .to_string()
                    .parse()
                    .unwrap_or_else(|_| f64::from(*value)),
            ),
            PropertyValue::DoubleValue(value) => serialize_finite(serializer, *value),
            PropertyValue::IntValue(value) => serializer.serialize_i64(*value),
            PropertyValue::UIntValue(value) => serializer.serialize_u64(*value),
            PropertyValue::SIntValue(value) => serializer.serialize_i64(*value),
            PropertyValue::BoolValue(value) => serializer.serialize_bool(*value),
        }
    }
}

/// JSON has no representation for NaN or infinities.
fn serialize_finite<S: Serializer>(serializer: S, value: f64) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return Err(S::Error::custom(format!("unsupported value: {value}")));
    }
    serializer.serialize_f64(value)
}

impl Feature {
    pub(crate) fn new(id: Option<u64>, geometry: Geometry, properties: Properties) -> Self {
        Feature {
            id,
            geometry,
            properties,
        }
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

impl Layer {
    pub(crate) fn new(name: String, version: u32, features: Vec<Feature>, extent: u32) -> Self {
        Layer {
            name,
            version,
            features,
            extent,
        }
    }

    pub fn extent(&self) -> u32 {
        self.extent
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }
}

impl Tile {
    pub(crate) fn new(layers: Vec<Layer>) -> Self {
        Tile { layers }
    }

    /// Layers in the order they appear in the tile.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::PropertyValue;

    #[test]
    fn test_property_value_json() {
        let values = vec![
            PropertyValue::StringValue("x".to_string()),
            PropertyValue::FloatValue(0.1),
            PropertyValue::DoubleValue(2.25),
            PropertyValue::IntValue(-3),
            PropertyValue::UIntValue(u64::MAX),
            PropertyValue::SIntValue(-7),
            PropertyValue::BoolValue(true),
        ];

        assert_eq!(
            serde_json::to_string(&values).unwrap(),
            r#"["x",0.1,2.25,-3,18446744073709551615,-7,true]"#
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        for value in [
            PropertyValue::DoubleValue(f64::NAN),
            PropertyValue::DoubleValue(f64::NEG_INFINITY),
            PropertyValue::FloatValue(f32::INFINITY),
        ] {
            let err = serde_json::to_string(&value).unwrap_err();
            assert!(err.to_string().contains("unsupported value"), "{err}");
            assert!(serde_json::to_value(&value).is_err());
        }
    }
}
