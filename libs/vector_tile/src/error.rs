//! Errors which can happen while decoding a vector tile.

use std::io;

use thiserror::Error;

/// Malformed protobuf input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("buffer ended inside a varint at offset {0}")]
    TruncatedVarint(usize),
    #[error("varint at offset {0} is longer than 10 bytes")]
    OverlongVarint(usize),
    #[error("field at offset {offset} needs {needed} bytes but only {remaining} remain")]
    LengthOutOfRange {
        offset: usize,
        needed: u64,
        remaining: usize,
    },
    #[error("unsupported wire type {wire_type} for field {field}")]
    UnsupportedWireType { field: u32, wire_type: u8 },
    #[error("field number {0} does not fit into 32 bits")]
    FieldNumberOutOfRange(u64),
    #[error("value {value} of field `{field}` does not fit into 32 bits")]
    ValueOutOfRange { field: &'static str, value: u64 },
    #[error("string field `{0}` is not valid UTF-8")]
    InvalidUtf8(&'static str),
    #[error("value message has no populated field")]
    EmptyValue,
    #[error("layer has no name")]
    MissingLayerName,
    #[error("layer `{0}` has an extent of 0")]
    ZeroExtent(String),
    #[error("feature has an odd number of tags ({0})")]
    OddTagCount(usize),
    #[error("key index {index} out of bounds for {len} keys")]
    KeyIndexOutOfBounds { index: u32, len: usize },
    #[error("value index {index} out of bounds for {len} values")]
    ValueIndexOutOfBounds { index: u32, len: usize },
}

/// A geometry command stream which cannot be interpreted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("unknown command id {0}")]
    UnknownCommand(u32),
    #[error("ClosePath is only valid for polygons")]
    ClosePathOutsidePolygon,
    #[error("ClosePath must have a count of 1, got {0}")]
    InvalidClosePathCount(u32),
    #[error("ClosePath without an open ring")]
    ClosePathWithoutRing,
    #[error("LineTo before any MoveTo")]
    LineToBeforeMoveTo,
    #[error("LineTo is not valid for points")]
    LineToInPoint,
    #[error("point geometry must contain exactly one MoveTo")]
    RepeatedMoveToInPoint,
    #[error("MoveTo must have a count of 1 for lines and polygons, got {0}")]
    InvalidMoveToCount(u32),
    #[error("command stream ended inside the parameters of a command")]
    TruncatedParameters,
    #[error("interior ring precedes any exterior ring")]
    InteriorRingFirst,
    #[error("polygon ring is not closed")]
    UnclosedRing,
    #[error("feature has no geometry")]
    Empty,
    #[error("unknown geometry type")]
    UnknownGeometryType,
}

#[derive(Error, Debug)]
pub enum Error {
    /// Reading the input failed
    #[error("error reading input: {0}")]
    IO(#[from] io::Error),
    #[error("no data received")]
    EmptyInput,
    /// The input starts with the gzip magic number but is not a valid gzip stream
    #[error("error handling gzipped data: {0}")]
    Decompression(#[source] io::Error),
    #[error("error parsing MVT tile: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("error decoding geometry: {0}")]
    Geometry(#[from] GeometryError),
    #[error("error marshaling to JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}
