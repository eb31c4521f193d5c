//! Blob compression codecs.
//!
//! A codec only transforms bytes; it knows nothing about shards or keys.
//! Its extension is appended to key names by the layout.

use std::fmt;
use std::io::{Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::{IoError, Result};

/// Byte-level encoding applied to every blob.
pub trait BlobCodec: fmt::Debug + Send + Sync {
    /// Suffix appended to keys, including the dot (empty for none).
    fn extension(&self) -> &str;

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>>;

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// gzip magic bytes (RFC 1952).
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// gzip compression via flate2.
#[derive(Debug, Clone, Copy)]
pub struct GzipCodec {
    level: Compression,
}

impl Default for GzipCodec {
    fn default() -> Self {
        GzipCodec {
            level: Compression::default(),
        }
    }
}

impl GzipCodec {
    /// Codec with a compression level; values above 9 are clamped.
    pub fn new(level: u32) -> Self {
        GzipCodec {
            level: Compression::new(level.min(9)),
        }
    }

    pub fn level(&self) -> u32 {
        self.level.level()
    }
}

impl BlobCodec for GzipCodec {
    fn extension(&self) -> &str {
        ".gz"
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 4), self.level);
        encoder
            .write_all(data)
            .map_err(|e| IoError::Codec(format!("gzip encode: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| IoError::Codec(format!("gzip encode: {}", e)))
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() < 2 || data[..2] != GZIP_MAGIC {
            return Err(IoError::Codec("not a gzip stream".to_string()));
        }
        let mut decoder = MultiGzDecoder::new(data);
        let mut out = Vec::with_capacity(data.len() * 4);
        decoder
            .read_to_end(&mut out)
            .map_err(|e| IoError::Codec(format!("gzip decode: {}", e)))?;
        Ok(out)
    }
}

/// Stores bytes as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl BlobCodec for IdentityCodec {
    fn extension(&self) -> &str {
        ""
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip_roundtrip() {
        let codec = GzipCodec::default();
        let data = br#"[{"p":"policy","l":"global","t":1.0,"r":[]}]"#.repeat(50);
        let encoded = codec.encode(&data).unwrap();
        assert_eq!(encoded[..2], GZIP_MAGIC);
        assert!(encoded.len() < data.len());
        assert_eq!(codec.decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_gzip_rejects_plain_bytes() {
        let err = GzipCodec::default().decode(b"[]").unwrap_err();
        assert!(matches!(err, IoError::Codec(_)));
    }

    #[test]
    fn test_gzip_truncated_stream() {
        let codec = GzipCodec::new(9);
        let encoded = codec.encode(&b"x".repeat(1000)).unwrap();
        let truncated = &encoded[..encoded.len() / 2];
        assert!(matches!(codec.decode(truncated), Err(IoError::Codec(_))));
    }

    #[test]
    fn test_level_clamped() {
        assert_eq!(GzipCodec::new(42).level(), 9);
        assert_eq!(GzipCodec::new(0).level(), 0);
    }

    #[test]
    fn test_identity() {
        let codec = IdentityCodec;
        assert_eq!(codec.extension(), "");
        assert_eq!(codec.decode(&codec.encode(b"abc").unwrap()).unwrap(), b"abc");
    }
}
