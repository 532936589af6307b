//! Decoding of the Tile, Layer and Feature messages.
//!
//! Decoding happens in two passes per layer: the wire messages are first read into raw
//! structures, then every feature is resolved against the dictionaries of its layer. Keys and
//! values may appear after the features in a layer message, so they cannot be resolved while
//! reading.

use crate::{
    error::{Error, ProtocolError},
    geometry::{decode_geometry, GeomType},
    properties::{decode_properties, decode_value},
    protobuf::{read_packed_u32, varint_to_u32, Reader, WireType},
    tile::{Feature, Layer, PropertyValue, Tile},
};

const DEFAULT_VERSION: u32 = 1;
const DEFAULT_EXTENT: u32 = 4096;

pub trait Decode<T> {
    fn decode(self) -> Result<T, Error>;
}

#[derive(Debug, Default)]
pub(crate) struct RawTile<'a> {
    layers: Vec<RawLayer<'a>>,
}

#[derive(Debug)]
pub(crate) struct RawLayer<'a> {
    name: &'a str,
    version: u32,
    extent: u32,
    keys: Vec<&'a str>,
    values: Vec<PropertyValue>,
    features: Vec<RawFeature>,
}

#[derive(Debug, PartialEq)]
pub(crate) struct RawFeature {
    id: Option<u64>,
    tags: Vec<u32>,
    geom_type: GeomType,
    geometry: Vec<u32>,
}

fn read_str<'a>(reader: &mut Reader<'a>, field: &'static str) -> Result<&'a str, ProtocolError> {
    std::str::from_utf8(reader.read_length_delimited()?)
        .map_err(|_| ProtocolError::InvalidUtf8(field))
}

/// Reads a repeated uint32 field in either its packed or its unpacked form.
fn read_repeated_u32(
    reader: &mut Reader,
    (number, wire_type): (u32, WireType),
    field: &'static str,
    out: &mut Vec<u32>,
) -> Result<(), ProtocolError> {
    match wire_type {
        WireType::LengthDelimited => read_packed_u32(reader.read_length_delimited()?, field, out),
        WireType::Varint => {
            out.push(varint_to_u32(reader.read_varint()?, field)?);
            Ok(())
        }
        other => Err(ProtocolError::UnsupportedWireType {
            field: number,
            wire_type: other as u8,
        }),
    }
}

impl<'a> RawTile<'a> {
    pub(crate) fn parse(data: &'a [u8]) -> Result<Self, ProtocolError> {
        let mut reader = Reader::new(data);
        let mut tile = RawTile::default();

        while !reader.is_empty() {
            match reader.read_field()? {
                (3, WireType::LengthDelimited) => tile
                    .layers
                    .push(RawLayer::parse(reader.read_length_delimited()?)?),
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }

        Ok(tile)
    }
}

impl<'a> RawLayer<'a> {
    pub(crate) fn parse(data: &'a [u8]) -> Result<Self, ProtocolError> {
        let mut reader = Reader::new(data);

        let mut name = None;
        let mut version = DEFAULT_VERSION;
        let mut extent = DEFAULT_EXTENT;
        let mut keys = Vec::new();
        let mut values = Vec::new();
        let mut features = Vec::new();

        while !reader.is_empty() {
            match reader.read_field()? {
                (1, WireType::LengthDelimited) => name = Some(read_str(&mut reader, "name")?),
                (2, WireType::LengthDelimited) => {
                    features.push(RawFeature::parse(reader.read_length_delimited()?)?)
                }
                (3, WireType::LengthDelimited) => keys.push(read_str(&mut reader, "keys")?),
                (4, WireType::LengthDelimited) => {
                    values.push(decode_value(reader.read_length_delimited()?)?)
                }
                (5, WireType::Varint) => extent = varint_to_u32(reader.read_varint()?, "extent")?,
                (15, WireType::Varint) => {
                    version = varint_to_u32(reader.read_varint()?, "version")?
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }

        let name = name
            .filter(|name| !name.is_empty())
            .ok_or(ProtocolError::MissingLayerName)?;
        if extent == 0 {
            return Err(ProtocolError::ZeroExtent(name.to_owned()));
        }

        Ok(RawLayer {
            name,
            version,
            extent,
            keys,
            values,
            features,
        })
    }
}

impl RawFeature {
    pub(crate) fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = Reader::new(data);
        let mut feature = RawFeature {
            id: None,
            tags: Vec::new(),
            geom_type: GeomType::Unknown,
            geometry: Vec::new(),
        };

        while !reader.is_empty() {
            match reader.read_field()? {
                (1, WireType::Varint) => feature.id = Some(reader.read_varint()?),
                (2, wire_type) => {
                    read_repeated_u32(&mut reader, (2, wire_type), "tags", &mut feature.tags)?
                }
                (3, WireType::Varint) => feature.geom_type = GeomType::from(reader.read_varint()?),
                (4, wire_type) => read_repeated_u32(
                    &mut reader,
                    (4, wire_type),
                    "geometry",
                    &mut feature.geometry,
                )?,
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }

        Ok(feature)
    }
}

/// Decode a Feature
impl Decode<Feature> for (&RawLayer<'_>, RawFeature) {
    fn decode(self) -> Result<Feature, Error> {
        let (layer, feature) = self;

        let properties = decode_properties(&feature.tags, &layer.keys, &layer.values)?;
        let geometry = decode_geometry(feature.geom_type, &feature.geometry)?;

        Ok(Feature::new(feature.id, geometry, properties))
    }
}

/// Decode a Layer
impl Decode<Layer> for RawLayer<'_> {
    fn decode(mut self) -> Result<Layer, Error> {
        let raw_features = std::mem::take(&mut self.features);
        let features = raw_features
            .into_iter()
            .map(|feature| (&self, feature).decode())
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "decoded layer {} (version {}, extent {}) with {} features",
            self.name,
            self.version,
            self.extent,
            features.len()
        );

        Ok(Layer::new(
            self.name.to_owned(),
            self.version,
            features,
            self.extent,
        ))
    }
}

/// Decode a whole Tile
impl Decode<Tile> for RawTile<'_> {
    fn decode(self) -> Result<Tile, Error> {
        let layers = self
            .layers
            .into_iter()
            .map(|layer| layer.decode())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Tile::new(layers))
    }
}

/// Decodes an uncompressed tile.
pub fn decode_tile(data: &[u8]) -> Result<Tile, Error> {
    RawTile::parse(data)?.decode()
}
