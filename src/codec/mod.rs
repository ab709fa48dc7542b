//! Byte-level codecs used by the pipeline phases.
//!
//! # Modules
//!
//! - [`compress`]: precompression algorithms (gzip, brotli, deflate, raw deflate)
//! - [`image`]: the ordered chain of image optimizer stages
//!
//! Every codec is built once from its option bag (validating it) and then
//! applied to many files through [`Codec::transform`].

pub mod compress;
pub mod image;
mod options;

pub use options::{CodecOptions, OptionReader, merge_options, unknown_options};

use thiserror::Error;

/// A configured byte transform.
pub trait Codec: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Transform `input` into new bytes.
    fn transform(&self, input: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Codec construction and invocation errors.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{codec}: invalid option `{key}`: {message}")]
    InvalidOption {
        codec: &'static str,
        key: String,
        message: String,
    },

    #[error("{codec}: {source}")]
    Io {
        codec: &'static str,
        source: std::io::Error,
    },

    #[error("{codec}: {source}")]
    Image {
        codec: &'static str,
        source: ::image::ImageError,
    },

    #[error("{codec}: {message}")]
    Failed {
        codec: &'static str,
        message: String,
    },
}

impl CodecError {
    pub fn io(codec: &'static str, source: std::io::Error) -> Self {
        Self::Io { codec, source }
    }

    pub fn image(codec: &'static str, source: ::image::ImageError) -> Self {
        Self::Image { codec, source }
    }

    pub fn failed(codec: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            codec,
            message: message.into(),
        }
    }
}
