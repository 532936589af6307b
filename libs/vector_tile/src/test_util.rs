//! Hand-rolled protobuf writer used to build fixtures in tests and benchmarks.

use crate::protobuf::zigzag_encode;

#[derive(Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn varint(&mut self, mut value: u64) -> &mut Self {
        while value >= 0x80 {
            self.buf.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
        self
    }

    fn key(&mut self, field: u32, wire_type: u8) -> &mut Self {
        self.varint((u64::from(field) << 3) | u64::from(wire_type))
    }

    pub fn varint_field(&mut self, field: u32, value: u64) -> &mut Self {
        self.key(field, 0).varint(value)
    }

    pub fn fixed64_field(&mut self, field: u32, value: u64) -> &mut Self {
        self.key(field, 1);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn fixed32_field(&mut self, field: u32, value: u32) -> &mut Self {
        self.key(field, 5);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn bytes_field(&mut self, field: u32, bytes: &[u8]) -> &mut Self {
        self.key(field, 2).varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn packed_field(&mut self, field: u32, values: &[u32]) -> &mut Self {
        let mut packed = WireWriter::new();
        for value in values {
            packed.varint(u64::from(*value));
        }
        self.bytes_field(field, &packed.into_bytes())
    }
}

pub fn command(id: u32, count: u32) -> u32 {
    (count << 3) | id
}

pub fn param(delta: i32) -> u32 {
    zigzag_encode(i64::from(delta)) as u32
}

/// Fixture builder for a Value message.
pub enum TestValue<'a> {
    String(&'a str),
    Float(f32),
    Double(f64),
    Int(i64),
    UInt(u64),
    SInt(i64),
    Bool(bool),
}

pub fn value_message(value: TestValue) -> Vec<u8> {
    let mut writer = WireWriter::new();
    match value {
        TestValue::String(s) => writer.bytes_field(1, s.as_bytes()),
        TestValue::Float(f) => writer.fixed32_field(2, f.to_bits()),
        TestValue::Double(d) => writer.fixed64_field(3, d.to_bits()),
        TestValue::Int(i) => writer.varint_field(4, i as u64),
        TestValue::UInt(u) => writer.varint_field(5, u),
        TestValue::SInt(s) => writer.varint_field(6, zigzag_encode(s)),
        TestValue::Bool(b) => writer.varint_field(7, u64::from(b)),
    };
    writer.into_bytes()
}

pub fn feature_message(
    id: Option<u64>,
    tags: &[u32],
    geom_type: u64,
    geometry: &[u32],
) -> Vec<u8> {
    let mut writer = WireWriter::new();
    if let Some(id) = id {
        writer.varint_field(1, id);
    }
    if !tags.is_empty() {
        writer.packed_field(2, tags);
    }
    writer.varint_field(3, geom_type);
    writer.packed_field(4, geometry);
    writer.into_bytes()
}

pub fn layer_message(
    name: &str,
    keys: &[&str],
    values: &[Vec<u8>],
    features: &[Vec<u8>],
) -> Vec<u8> {
    let mut writer = WireWriter::new();
    writer.varint_field(15, 2);
    writer.bytes_field(1, name.as_bytes());
    for feature in features {
        writer.bytes_field(2, feature);
    }
    for key in keys {
        writer.bytes_field(3, key.as_bytes());
    }
    for value in values {
        writer.bytes_field(4, value);
    }
    writer.varint_field(5, 4096);
    writer.into_bytes()
}

pub fn tile_message(layers: &[Vec<u8>]) -> Vec<u8> {
    let mut writer = WireWriter::new();
    for layer in layers {
        writer.bytes_field(3, layer);
    }
    writer.into_bytes()
}

/// The single-layer tile with one line feature used throughout the tests.
pub fn roads_tile() -> Vec<u8> {
    let feature = feature_message(None, &[], 2, &[command(1, 1), 4, 4, command(2, 1), 10, 0]);
    tile_message(&[layer_message("roads", &[], &[], &[feature])])
}
