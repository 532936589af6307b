use std::{borrow::Cow, io::Read};

use flate2::bufread::MultiGzDecoder;

use crate::error::Error;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzipped(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Strips gzip framing if the data starts with the gzip magic number. Any other input is
/// returned as is.
pub fn normalize(data: &[u8]) -> Result<Cow<'_, [u8]>, Error> {
    if !is_gzipped(data) {
        return Ok(Cow::Borrowed(data));
    }

    log::debug!("input is gzipped ({} bytes)", data.len());

    let mut decoder = MultiGzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(Error::Decompression)?;

    Ok(Cow::Owned(decompressed))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};

    use super::*;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_short_input_unchanged() {
        assert_eq!(normalize(&[]).unwrap().as_ref(), &[] as &[u8]);
        assert_eq!(normalize(&[0x1f]).unwrap().as_ref(), &[0x1f]);
    }

    #[test]
    fn test_plain_input_borrowed() {
        let data = [0x1a, 0x03, 0x0a, 0x01, 0x61];
        assert!(matches!(normalize(&data).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_gzip_decompressed() {
        let payload = b"some tile payload".to_vec();
        let compressed = gzip(&payload);
        let normalized = normalize(&compressed).unwrap();
        assert_eq!(normalized.as_ref(), payload.as_slice());
    }

    #[test]
    fn test_concatenated_members() {
        let mut data = gzip(b"first ");
        data.extend(gzip(b"second"));
        assert_eq!(normalize(&data).unwrap().as_ref(), b"first second");
    }

    #[test]
    fn test_invalid_header_fails() {
        let data = [0x1f, 0x8b, 0x00, 0x00];
        assert!(matches!(normalize(&data), Err(Error::Decompression(_))));
    }

    #[test]
    fn test_truncated_stream_fails() {
        let data = gzip(&[7u8; 512]);
        let truncated = &data[..data.len() - 6];
        assert!(matches!(normalize(truncated), Err(Error::Decompression(_))));
    }
}
