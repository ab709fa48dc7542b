//! Raster re-encoding with the `image` crate.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, GenericImageView, ImageEncoder, ImageFormat};

use crate::codec::CodecError;

/// Lossy JPEG re-encode at `quality` (1..=100).
pub fn reencode_jpeg(input: &[u8], quality: u8) -> Result<Vec<u8>, CodecError> {
    let image = image::load_from_memory_with_format(input, ImageFormat::Jpeg)
        .map_err(|e| CodecError::image("mozjpeg", e))?;
    // JPEG has no alpha channel
    let rgb = image.to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| CodecError::image("mozjpeg", e))?;
    Ok(out)
}

/// Lossless PNG recompression. Returns the input if nothing was gained.
pub fn recompress_png(input: &[u8], level: u8) -> Result<Vec<u8>, CodecError> {
    let image = image::load_from_memory_with_format(input, ImageFormat::Png)
        .map_err(|e| CodecError::image("optipng", e))?;
    let (width, height) = image.dimensions();
    let color = image.color();
    let raw = image.into_bytes();

    let (compression, filter) = match level {
        0 | 1 => (CompressionType::Fast, FilterType::NoFilter),
        2..=5 => (CompressionType::Default, FilterType::Adaptive),
        _ => (CompressionType::Best, FilterType::Adaptive),
    };

    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, compression, filter)
        .write_image(&raw, width, height, color.into())
        .map_err(|e| CodecError::image("optipng", e))?;

    Ok(smaller_of(input, out))
}

/// Lossless WebP conversion of a PNG or JPEG.
pub fn encode_webp(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let image = image::load_from_memory(input).map_err(|e| CodecError::image("webp", e))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut out = Vec::new();
    WebPEncoder::new_lossless(&mut out)
        .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|e| CodecError::image("webp", e))?;
    Ok(out)
}

pub(super) fn smaller_of(input: &[u8], output: Vec<u8>) -> Vec<u8> {
    if output.len() < input.len() {
        output
    } else {
        input.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::image::tests::png_fixture;
    use image::DynamicImage;
    use std::io::Cursor;

    fn jpeg_fixture() -> Vec<u8> {
        let img = image::RgbImage::from_fn(64, 64, |x, y| image::Rgb([x as u8 * 4, y as u8 * 4, 90]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Jpeg)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_reencode_jpeg_stays_jpeg() {
        let out = reencode_jpeg(&jpeg_fixture(), 20).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));
    }

    #[test]
    fn test_recompress_png_never_grows() {
        let input = png_fixture();
        let out = recompress_png(&input, 7).unwrap();
        assert!(out.len() <= input.len());
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_encode_webp_from_jpeg() {
        let out = encode_webp(&jpeg_fixture()).unwrap();
        let decoded = image::load_from_memory_with_format(&out, ImageFormat::WebP).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));
    }

    #[test]
    fn test_smaller_of() {
        assert_eq!(smaller_of(b"abc", b"ab".to_vec()), b"ab");
        assert_eq!(smaller_of(b"abc", b"abcd".to_vec()), b"abc");
    }
}
