//! Precompression algorithms.
//!
//! | Algorithm     | Container          | Default extension |
//! |---------------|--------------------|-------------------|
//! | `gzip`        | gzip (RFC 1952)    | `.gz`             |
//! | `brotli`      | brotli (RFC 7932)  | `.br`             |
//! | `deflate`     | zlib (RFC 1950)    | none              |
//! | `deflate-raw` | raw deflate (1951) | none              |
//!
//! The two deflate variants have no conventional file extension, so one
//! must be configured explicitly.

use std::io::Write;

use brotli::enc::BrotliEncoderParams;
use brotli::enc::backward_references::BrotliEncoderMode;
use flate2::Compression;
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Codec, CodecError, CodecOptions, OptionReader, merge_options};

/// Supported precompression algorithms.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    #[default]
    Gzip,
    #[serde(alias = "brotliCompress")]
    Brotli,
    Deflate,
    #[serde(alias = "deflateRaw")]
    DeflateRaw,
}

impl Algorithm {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Brotli => "brotli",
            Self::Deflate => "deflate",
            Self::DeflateRaw => "deflate-raw",
        }
    }

    /// Built-in output extension, if the algorithm has a conventional one.
    pub const fn default_extension(self) -> Option<&'static str> {
        match self {
            Self::Gzip => Some(".gz"),
            Self::Brotli => Some(".br"),
            Self::Deflate | Self::DeflateRaw => None,
        }
    }

    /// Built-in options, strongest compression.
    pub fn default_options(self) -> CodecOptions {
        let value = match self {
            Self::Gzip | Self::Deflate | Self::DeflateRaw => json!({ "level": 9 }),
            Self::Brotli => json!({ "quality": 11, "lgwin": 22, "mode": "text" }),
        };
        value.as_object().cloned().unwrap_or_default()
    }
}

/// A compressor with validated parameters.
#[derive(Debug, Clone)]
pub enum Compressor {
    Gzip { level: u32 },
    Zlib { level: u32 },
    RawDeflate { level: u32 },
    Brotli { quality: i32, lgwin: i32, mode: BrotliMode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrotliMode {
    Generic,
    Text,
    Font,
}

impl Compressor {
    /// Build a compressor from caller options merged over the defaults.
    pub fn new(algorithm: Algorithm, options: &CodecOptions) -> Result<Self, CodecError> {
        let merged = merge_options(algorithm.default_options(), options);
        let reader = OptionReader::new(algorithm.name(), &merged);

        #[allow(clippy::cast_possible_truncation)]
        let compressor = match algorithm {
            Algorithm::Gzip => Self::Gzip {
                level: reader.uint("level", 0..=9, 9)? as u32,
            },
            Algorithm::Deflate => Self::Zlib {
                level: reader.uint("level", 0..=9, 9)? as u32,
            },
            Algorithm::DeflateRaw => Self::RawDeflate {
                level: reader.uint("level", 0..=9, 9)? as u32,
            },
            Algorithm::Brotli => Self::Brotli {
                quality: reader.uint("quality", 0..=11, 11)? as i32,
                lgwin: reader.uint("lgwin", 10..=24, 22)? as i32,
                mode: match reader.string("mode", "text")? {
                    "generic" => BrotliMode::Generic,
                    "text" => BrotliMode::Text,
                    "font" => BrotliMode::Font,
                    other => {
                        return Err(CodecError::InvalidOption {
                            codec: algorithm.name(),
                            key: "mode".into(),
                            message: format!("unknown mode `{other}` (generic | text | font)"),
                        });
                    }
                },
            },
        };
        Ok(compressor)
    }
}

impl Codec for Compressor {
    fn name(&self) -> &'static str {
        match self {
            Self::Gzip { .. } => "gzip",
            Self::Zlib { .. } => "deflate",
            Self::RawDeflate { .. } => "deflate-raw",
            Self::Brotli { .. } => "brotli",
        }
    }

    fn transform(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        let name = self.name();
        let io = |e| CodecError::io(name, e);

        match *self {
            Self::Gzip { level } => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
                encoder.write_all(input).map_err(io)?;
                encoder.finish().map_err(io)
            }
            Self::Zlib { level } => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
                encoder.write_all(input).map_err(io)?;
                encoder.finish().map_err(io)
            }
            Self::RawDeflate { level } => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
                encoder.write_all(input).map_err(io)?;
                encoder.finish().map_err(io)
            }
            Self::Brotli {
                quality,
                lgwin,
                mode,
            } => {
                let params = BrotliEncoderParams {
                    quality,
                    lgwin,
                    mode: match mode {
                        BrotliMode::Generic => BrotliEncoderMode::BROTLI_MODE_GENERIC,
                        BrotliMode::Text => BrotliEncoderMode::BROTLI_MODE_TEXT,
                        BrotliMode::Font => BrotliEncoderMode::BROTLI_MODE_FONT,
                    },
                    ..BrotliEncoderParams::default()
                };
                let mut reader = input;
                let mut output = Vec::with_capacity(input.len() / 2);
                brotli::BrotliCompress(&mut reader, &mut output, &params).map_err(io)?;
                Ok(output)
            }
        }
    }
}

/// Output path for a compressed sibling: `original + extension`.
///
/// A missing leading dot is added, so `gz` and `.gz` behave the same.
pub fn output_path(original: &std::path::Path, extension: &str) -> std::path::PathBuf {
    let mut name = original.as_os_str().to_owned();
    if !extension.starts_with('.') {
        name.push(".");
    }
    name.push(extension);
    name.into()
}
