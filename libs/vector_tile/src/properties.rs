//! Resolution of feature tags against the key and value dictionaries of a layer.

use crate::{
    error::ProtocolError,
    protobuf::{zigzag_decode, Reader, WireType},
    tile::{Properties, PropertyValue},
};

/// Decodes a Value message.
///
/// The message should set exactly one field. If it sets several, the one with the lowest
/// field number wins; repeated occurrences of the same field keep the last one.
pub fn decode_value(data: &[u8]) -> Result<PropertyValue, ProtocolError> {
    let mut reader = Reader::new(data);
    let mut slots: [Option<PropertyValue>; 7] = Default::default();

    while !reader.is_empty() {
        let (field, wire_type) = reader.read_field()?;
        let value = match (field, wire_type) {
            (1, WireType::LengthDelimited) => {
                let bytes = reader.read_length_delimited()?;
                let string = std::str::from_utf8(bytes)
                    .map_err(|_| ProtocolError::InvalidUtf8("string_value"))?;
                PropertyValue::StringValue(string.to_owned())
            }
            (2, WireType::Fixed32) => {
                PropertyValue::FloatValue(f32::from_le_bytes(reader.read_fixed32()?))
            }
            (3, WireType::Fixed64) => {
                PropertyValue::DoubleValue(f64::from_le_bytes(reader.read_fixed64()?))
            }
            (4, WireType::Varint) => PropertyValue::IntValue(reader.read_varint()? as i64),
            (5, WireType::Varint) => PropertyValue::UIntValue(reader.read_varint()?),
            (6, WireType::Varint) => PropertyValue::SIntValue(zigzag_decode(reader.read_varint()?)),
            (7, WireType::Varint) => PropertyValue::BoolValue(reader.read_varint()? != 0),
            (_, wire_type) => {
                reader.skip(wire_type)?;
                continue;
            }
        };
        slots[field as usize - 1] = Some(value);
    }

    slots
        .into_iter()
        .flatten()
        .next()
        .ok_or(ProtocolError::EmptyValue)
}

/// Resolves `(key index, value index)` pairs into a property map. Later duplicates of a key
/// overwrite earlier ones but keep the position of the first occurrence.
pub fn decode_properties(
    tags: &[u32],
    keys: &[&str],
    values: &[PropertyValue],
) -> Result<Properties, ProtocolError> {
    if tags.len() % 2 != 0 {
        return Err(ProtocolError::OddTagCount(tags.len()));
    }

    let mut properties = Properties::with_capacity(tags.len() / 2);
    for pair in tags.chunks_exact(2) {
        let (key_index, value_index) = (pair[0], pair[1]);

        let key = keys
            .get(key_index as usize)
            .ok_or(ProtocolError::KeyIndexOutOfBounds {
                index: key_index,
                len: keys.len(),
            })?;
        let value = values
            .get(value_index as usize)
            .ok_or(ProtocolError::ValueIndexOutOfBounds {
                index: value_index,
                len: values.len(),
            })?;

        properties.insert((*key).to_owned(), value.clone());
    }

    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{value_message, TestValue, WireWriter};

    fn dictionary() -> (Vec<&'static str>, Vec<PropertyValue>) {
        (
            vec!["a", "b"],
            vec![
                PropertyValue::StringValue("x".to_string()),
                PropertyValue::IntValue(42),
            ],
        )
    }

    #[test]
    fn test_resolve_pairs() {
        let (keys, values) = dictionary();
        let properties = decode_properties(&[0, 0, 1, 1], &keys, &values).unwrap();

        assert_eq!(
            properties.into_iter().collect::<Vec<_>>(),
            vec![
                ("a".to_string(), PropertyValue::StringValue("x".to_string())),
                ("b".to_string(), PropertyValue::IntValue(42)),
            ]
        );
    }

    #[test]
    fn test_duplicate_key_overwrites() {
        let (keys, values) = dictionary();
        let properties = decode_properties(&[0, 0, 1, 0, 0, 1], &keys, &values).unwrap();

        assert_eq!(properties.len(), 2);
        assert_eq!(properties["a"], PropertyValue::IntValue(42));
        assert_eq!(properties.get_index(0).unwrap().0, "a");
    }

    #[test]
    fn test_no_tags() {
        let (keys, values) = dictionary();
        assert!(decode_properties(&[], &keys, &values).unwrap().is_empty());
    }

    #[test]
    fn test_odd_tags() {
        let (keys, values) = dictionary();
        assert_eq!(
            decode_properties(&[0, 0, 1], &keys, &values),
            Err(ProtocolError::OddTagCount(3))
        );
    }

    #[test]
    fn test_key_out_of_bounds() {
        let (keys, values) = dictionary();
        assert_eq!(
            decode_properties(&[5, 0], &keys, &values),
            Err(ProtocolError::KeyIndexOutOfBounds { index: 5, len: 2 })
        );
    }

    #[test]
    fn test_value_out_of_bounds() {
        let (keys, values) = dictionary();
        assert_eq!(
            decode_properties(&[0, 2], &keys, &values),
            Err(ProtocolError::ValueIndexOutOfBounds { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_decode_each_variant() {
        let cases = vec![
            (
                TestValue::String("main"),
                PropertyValue::StringValue("main".to_string()),
            ),
            (TestValue::Float(1.5), PropertyValue::FloatValue(1.5)),
            (TestValue::Double(-0.25), PropertyValue::DoubleValue(-0.25)),
            (TestValue::Int(-12), PropertyValue::IntValue(-12)),
            (TestValue::UInt(1 << 40), PropertyValue::UIntValue(1 << 40)),
            (TestValue::SInt(-3), PropertyValue::SIntValue(-3)),
            (TestValue::Bool(true), PropertyValue::BoolValue(true)),
        ];

        for (input, expected) in cases {
            assert_eq!(decode_value(&value_message(input)).unwrap(), expected);
        }
    }

    #[test]
    fn test_lowest_field_wins() {
        let mut writer = WireWriter::new();
        writer.varint_field(7, 1);
        writer.varint_field(5, 9);
        writer.fixed64_field(3, 2.5f64.to_bits());
        assert_eq!(
            decode_value(&writer.into_bytes()).unwrap(),
            PropertyValue::DoubleValue(2.5)
        );
    }

    #[test]
    fn test_repeated_field_last_wins() {
        let mut writer = WireWriter::new();
        writer.varint_field(5, 1);
        writer.varint_field(5, 2);
        assert_eq!(
            decode_value(&writer.into_bytes()).unwrap(),
            PropertyValue::UIntValue(2)
        );
    }

    #[test]
    fn test_unknown_fields_skipped() {
        let mut writer = WireWriter::new();
        writer.bytes_field(9, b"extension");
        writer.varint_field(7, 0);
        assert_eq!(
            decode_value(&writer.into_bytes()).unwrap(),
            PropertyValue::BoolValue(false)
        );
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(decode_value(&[]), Err(ProtocolError::EmptyValue));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut writer = WireWriter::new();
        writer.bytes_field(1, &[0xff, 0xfe]);
        assert_eq!(
            decode_value(&writer.into_bytes()),
            Err(ProtocolError::InvalidUtf8("string_value"))
        );
    }
}
