//! Decoder for Mapbox Vector Tiles.
//!
//! A tile is read as a whole, stripped of gzip framing if present, decoded into [`tile::Tile`]
//! and can then be projected into a JSON tree of layers, features, geometries and properties.

use std::io::Read;

use crate::error::Error;
use crate::tile::Tile;

mod encoding;
mod properties;
mod protobuf;

#[cfg(any(test, feature = "test-util"))]
#[doc(hidden)]
pub mod test_util;

pub mod compression;
pub mod error;
pub mod geometry;
pub mod projection;
pub mod tile;

pub use protobuf::{zigzag_decode, zigzag_encode};

/// Reads the whole stream and decodes it as a tile.
pub fn parse_tile_reader<R: Read>(reader: &mut R) -> Result<Tile, Error> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    parse_tile_bytes(&data)
}

/// Decodes a tile which is optionally gzip compressed.
pub fn parse_tile_bytes(data: &[u8]) -> Result<Tile, Error> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }

    let data = compression::normalize(data)?;
    encoding::decode_tile(&data)
}

/// Renders a tile as pretty-printed JSON.
pub fn to_json_pretty(tile: &Tile) -> Result<String, Error> {
    let value = projection::project(tile)?;
    Ok(serde_json::to_string_pretty(&value)?)
}
