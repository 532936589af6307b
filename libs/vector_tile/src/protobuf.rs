//! Protobuf wire format primitives.
//!
//! All message decoding in this crate goes through [`Reader`]; nothing else touches the raw
//! bytes.

use crate::error::ProtocolError;

/// A varint can hold at most 64 bits, which needs 10 groups of 7 bits.
const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

impl WireType {
    fn from_raw(field: u32, wire_type: u8) -> Result<Self, ProtocolError> {
        match wire_type {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            _ => Err(ProtocolError::UnsupportedWireType { field, wire_type }),
        }
    }
}

pub fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// A cursor over a protobuf encoded buffer.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_varint(&mut self) -> Result<u64, ProtocolError> {
        let start = self.pos;
        let mut value = 0u64;

        for i in 0..MAX_VARINT_LEN {
            let byte = *self
                .data
                .get(self.pos)
                .ok_or(ProtocolError::TruncatedVarint(start))?;
            self.pos += 1;

            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }

        Err(ProtocolError::OverlongVarint(start))
    }

    /// Reads a field key and splits it into field number and wire type.
    pub fn read_tag(&mut self) -> Result<(u32, u8), ProtocolError> {
        let tag = self.read_varint()?;
        let field = u32::try_from(tag >> 3)
            .map_err(|_| ProtocolError::FieldNumberOutOfRange(tag >> 3))?;
        Ok((field, (tag & 0x7) as u8))
    }

    /// Reads a field key and resolves its wire type.
    pub fn read_field(&mut self) -> Result<(u32, WireType), ProtocolError> {
        let (field, wire_type) = self.read_tag()?;
        Ok((field, WireType::from_raw(field, wire_type)?))
    }

    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], ProtocolError> {
        let offset = self.pos;
        let len = self.read_varint()?;
        self.take(offset, len)
    }

    pub fn read_fixed32(&mut self) -> Result<[u8; 4], ProtocolError> {
        let bytes = self.take(self.pos, 4)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_fixed64(&mut self) -> Result<[u8; 8], ProtocolError> {
        let bytes = self.take(self.pos, 8)?;
        let mut out = [0u8; 8];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Consumes and discards a single field value of the given wire type.
    pub fn skip(&mut self, wire_type: WireType) -> Result<(), ProtocolError> {
        match wire_type {
            WireType::Varint => self.read_varint().map(drop),
            WireType::Fixed64 => self.read_fixed64().map(drop),
            WireType::LengthDelimited => self.read_length_delimited().map(drop),
            WireType::Fixed32 => self.read_fixed32().map(drop),
        }
    }

    fn take(&mut self, offset: usize, len: u64) -> Result<&'a [u8], ProtocolError> {
        let remaining = self.remaining();
        let out_of_range = ProtocolError::LengthOutOfRange {
            offset,
            needed: len,
            remaining,
        };
        let len = usize::try_from(len).map_err(|_| out_of_range.clone())?;
        if len > remaining {
            return Err(out_of_range);
        }

        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}

/// Reads a packed run of varints which must each fit into 32 bits.
pub fn read_packed_u32(
    data: &[u8],
    field: &'static str,
    out: &mut Vec<u32>,
) -> Result<(), ProtocolError> {
    let mut reader = Reader::new(data);
    while !reader.is_empty() {
        out.push(varint_to_u32(reader.read_varint()?, field)?);
    }
    Ok(())
}

pub fn varint_to_u32(value: u64, field: &'static str) -> Result<u32, ProtocolError> {
    u32::try_from(value).map_err(|_| ProtocolError::ValueOutOfRange { field, value })
}
