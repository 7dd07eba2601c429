use super::cv;
use crate::errors::DataReadingError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{
    Read,
    Write,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    Float32,
    #[default]
    Float64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayCompression {
    #[default]
    None,
    Zlib,
}

/// How a `<binary>` payload is encoded, collected from its cvParams.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayEncoding {
    pub precision: Precision,
    pub compression: ArrayCompression,
    /// First accession we know but cannot decode, reported on decode.
    pub unsupported: Option<&'static str>,
}

impl ArrayEncoding {
    /// Updates the encoding from one cvParam accession. Returns false when
    /// the accession says nothing about the encoding.
    pub fn apply_accession(&mut self, accession: &str) -> bool {
        match accession {
            cv::FLOAT_32 => self.precision = Precision::Float32,
            cv::FLOAT_64 => self.precision = Precision::Float64,
            cv::ZLIB_COMPRESSION => self.compression = ArrayCompression::Zlib,
            cv::NO_COMPRESSION => self.compression = ArrayCompression::None,
            cv::INT_32 => self.unsupported = Some("32-bit integer"),
            cv::INT_64 => self.unsupported = Some("64-bit integer"),
            cv::NUMPRESS_LINEAR => self.unsupported = Some("MS-Numpress linear"),
            cv::NUMPRESS_PIC => self.unsupported = Some("MS-Numpress pic"),
            cv::NUMPRESS_SLOF => self.unsupported = Some("MS-Numpress slof"),
            _ => return false,
        }
        true
    }
}

/// Decodes a base64 `<binary>` payload into f64 values.
pub fn decode_array(
    encoded: &[u8],
    encoding: &ArrayEncoding,
    spectrum: usize,
) -> Result<Vec<f64>, DataReadingError> {
    if let Some(name) = encoding.unsupported {
        return Err(DataReadingError::UnsupportedEncoding {
            encoding: name.to_string(),
            spectrum,
        });
    }

    // Base64 payloads are allowed to wrap across lines.
    let cleaned: Vec<u8> = encoded
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let raw = STANDARD.decode(cleaned)?;

    let bytes = match encoding.compression {
        ArrayCompression::None => raw,
        ArrayCompression::Zlib => {
            let mut decoder = ZlibDecoder::new(&raw[..]);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed)?;
            decompressed
        }
    };

    let out = match encoding.precision {
        Precision::Float32 => bytes
            .chunks_exact(4)
            .map(|chunk| {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(chunk);
                f32::from_le_bytes(buf) as f64
            })
            .collect(),
        Precision::Float64 => bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                f64::from_le_bytes(buf)
            })
            .collect(),
    };
    Ok(out)
}

/// Encodes values as little endian 64-bit floats, optionally zlib compressed,
/// then base64.
pub fn encode_array(values: &[f64], compress: bool) -> Result<String, DataReadingError> {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    if compress {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bytes)?;
        bytes = encoder.finish()?;
    }
    Ok(STANDARD.encode(bytes))
}
