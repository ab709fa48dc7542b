//! Image optimizer chain.
//!
//! Stages always run in the same order regardless of how they were
//! configured:
//!
//! ```text
//! gifsicle → mozjpeg → pngquant → optipng → svgo → webp → jpegtran
//! ```
//!
//! Each stage only touches the format it understands. The format comes from
//! the file extension and follows the bytes through the chain, so after
//! `webp` has converted a PNG the PNG and JPEG stages leave it alone.

mod external;
mod raster;
mod svg;

use std::path::Path;

use serde_json::json;

use super::{Codec, CodecError, CodecOptions, OptionReader, merge_options};

/// Image formats recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Gif,
    Jpeg,
    Png,
    Svg,
    Bmp,
    Webp,
}

impl ImageFormat {
    /// Format implied by the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Some(match ext.as_str() {
            "gif" => Self::Gif,
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "svg" => Self::Svg,
            "bmp" => Self::Bmp,
            "webp" => Self::Webp,
            _ => return None,
        })
    }
}

/// Optimizer stages, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Gifsicle,
    Mozjpeg,
    Pngquant,
    Optipng,
    Svgo,
    Webp,
    Jpegtran,
}

impl Stage {
    pub const ORDER: [Stage; 7] = [
        Self::Gifsicle,
        Self::Mozjpeg,
        Self::Pngquant,
        Self::Optipng,
        Self::Svgo,
        Self::Webp,
        Self::Jpegtran,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Gifsicle => "gifsicle",
            Self::Mozjpeg => "mozjpeg",
            Self::Pngquant => "pngquant",
            Self::Optipng => "optipng",
            Self::Svgo => "svgo",
            Self::Webp => "webp",
            Self::Jpegtran => "jpegtran",
        }
    }

    /// Whether the stage runs when the config leaves it unset.
    pub const fn enabled_by_default(self) -> bool {
        matches!(self, Self::Gifsicle | Self::Svgo | Self::Jpegtran)
    }

    pub const fn accepts(self, format: ImageFormat) -> bool {
        use ImageFormat as F;
        match self {
            Self::Gifsicle => matches!(format, F::Gif),
            Self::Mozjpeg | Self::Jpegtran => matches!(format, F::Jpeg),
            Self::Pngquant | Self::Optipng => matches!(format, F::Png),
            Self::Svgo => matches!(format, F::Svg),
            Self::Webp => matches!(format, F::Png | F::Jpeg),
        }
    }

    pub fn default_options(self) -> CodecOptions {
        let value = match self {
            Self::Gifsicle => json!({ "optimization_level": 3, "interlaced": false }),
            Self::Mozjpeg => json!({ "quality": 20 }),
            Self::Pngquant => json!({ "quality": [0.8, 0.9], "speed": 4 }),
            Self::Optipng => json!({ "optimization_level": 7 }),
            Self::Svgo => json!({ "precision": 3 }),
            Self::Webp => json!({}),
            Self::Jpegtran => json!({ "progressive": false }),
        };
        value.as_object().cloned().unwrap_or_default()
    }

    /// Resolve caller options (merged over the defaults) into a runnable stage.
    #[allow(clippy::cast_possible_truncation)]
    pub fn configure(self, options: &CodecOptions) -> Result<ConfiguredStage, CodecError> {
        let merged = merge_options(self.default_options(), options);
        let r = OptionReader::new(self.name(), &merged);

        Ok(match self {
            Self::Gifsicle => ConfiguredStage::Gifsicle {
                // gifsicle only knows -O1..-O3; higher levels mean "max".
                level: r.uint("optimization_level", 0..=7, 3)?.clamp(1, 3) as u8,
                interlaced: r.boolean("interlaced", false)?,
            },
            Self::Mozjpeg => ConfiguredStage::Mozjpeg {
                quality: r.uint("quality", 1..=100, 20)? as u8,
            },
            Self::Pngquant => {
                let (min, max) = r.float_pair("quality", 0.0..=1.0, (0.8, 0.9))?;
                ConfiguredStage::Pngquant {
                    quality: (percent(min), percent(max)),
                    speed: r.uint("speed", 1..=11, 4)? as u8,
                }
            }
            Self::Optipng => ConfiguredStage::Optipng {
                level: r.uint("optimization_level", 0..=7, 7)? as u8,
            },
            Self::Svgo => ConfiguredStage::Svgo {
                precision: r.uint("precision", 0..=8, 3)? as u8,
            },
            Self::Webp => ConfiguredStage::Webp,
            Self::Jpegtran => ConfiguredStage::Jpegtran {
                progressive: r.boolean("progressive", false)?,
            },
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(fraction: f64) -> u8 {
    (fraction * 100.0).round() as u8
}

/// A stage with resolved parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfiguredStage {
    Gifsicle { level: u8, interlaced: bool },
    Mozjpeg { quality: u8 },
    Pngquant { quality: (u8, u8), speed: u8 },
    Optipng { level: u8 },
    Svgo { precision: u8 },
    Webp,
    Jpegtran { progressive: bool },
}

impl ConfiguredStage {
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Gifsicle { .. } => Stage::Gifsicle,
            Self::Mozjpeg { .. } => Stage::Mozjpeg,
            Self::Pngquant { .. } => Stage::Pngquant,
            Self::Optipng { .. } => Stage::Optipng,
            Self::Svgo { .. } => Stage::Svgo,
            Self::Webp => Stage::Webp,
            Self::Jpegtran { .. } => Stage::Jpegtran,
        }
    }

    /// Format of this stage's output given its input format.
    const fn output_format(&self, input: ImageFormat) -> ImageFormat {
        match self {
            Self::Webp => ImageFormat::Webp,
            _ => input,
        }
    }
}

impl Codec for ConfiguredStage {
    fn name(&self) -> &'static str {
        self.stage().name()
    }

    fn transform(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        match *self {
            Self::Gifsicle { level, interlaced } => external::gifsicle(input, level, interlaced),
            Self::Mozjpeg { quality } => raster::reencode_jpeg(input, quality),
            Self::Pngquant { quality, speed } => external::pngquant(input, quality, speed),
            Self::Optipng { level } => raster::recompress_png(input, level),
            Self::Svgo { precision } => svg::minify(input, precision),
            Self::Webp => raster::encode_webp(input),
            Self::Jpegtran { progressive } => external::jpegtran(input, progressive),
        }
    }
}

/// The enabled stages, sorted into chain order.
#[derive(Debug, Clone, Default)]
pub struct ImageChain {
    stages: Vec<ConfiguredStage>,
}

impl ImageChain {
    /// Build a chain from `(stage, options)` pairs in any order.
    ///
    /// A stage listed twice keeps its last options.
    pub fn new<I>(enabled: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = (Stage, CodecOptions)>,
    {
        let mut stages: Vec<ConfiguredStage> = Vec::new();
        for (stage, options) in enabled {
            let configured = stage.configure(&options)?;
            stages.retain(|s| s.stage() != stage);
            stages.push(configured);
        }
        stages.sort_by_key(ConfiguredStage::stage);
        Ok(Self { stages })
    }

    /// Chain with the default-enabled stages and built-in options.
    #[cfg(test)]
    pub fn with_defaults() -> Result<Self, CodecError> {
        Self::new(
            Stage::ORDER
                .into_iter()
                .filter(|s| s.enabled_by_default())
                .map(|s| (s, CodecOptions::new())),
        )
    }

    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.stages.iter().map(ConfiguredStage::stage)
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Whether any stage would touch a file of this format.
    pub fn handles(&self, format: ImageFormat) -> bool {
        self.stages.iter().any(|s| s.stage().accepts(format))
    }

    /// Run every applicable stage over `input`.
    ///
    /// Returns the final bytes and the format they are in. Bytes of a format
    /// no stage understands come back unchanged.
    pub fn apply(
        &self,
        format: ImageFormat,
        input: Vec<u8>,
    ) -> Result<(Vec<u8>, ImageFormat), CodecError> {
        let mut format = format;
        let mut bytes = input;
        for stage in &self.stages {
            if !stage.stage().accepts(format) {
                continue;
            }
            bytes = stage.transform(&bytes)?;
            format = stage.output_format(format);
        }
        Ok((bytes, format))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    pub(crate) fn png_fixture() -> Vec<u8> {
        let img = ::image::RgbaImage::from_fn(32, 32, |x, y| {
            ::image::Rgba([(x * 8) as u8, (y * 8) as u8, 128, 255])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ::image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ImageFormat::from_path(Path::new("a/logo.PNG")),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("photo.jpg")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_path(Path::new("app.js")), None);
        assert_eq!(ImageFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_chain_sorted_into_fixed_order() {
        let chain = ImageChain::new([
            (Stage::Jpegtran, CodecOptions::new()),
            (Stage::Webp, CodecOptions::new()),
            (Stage::Gifsicle, CodecOptions::new()),
            (Stage::Optipng, CodecOptions::new()),
        ])
        .unwrap();
        let order: Vec<_> = chain.stages().collect();
        assert_eq!(
            order,
            [Stage::Gifsicle, Stage::Optipng, Stage::Webp, Stage::Jpegtran]
        );
    }

    #[test]
    fn test_default_chain() {
        let chain = ImageChain::with_defaults().unwrap();
        let order: Vec<_> = chain.stages().collect();
        assert_eq!(order, [Stage::Gifsicle, Stage::Svgo, Stage::Jpegtran]);
        assert!(chain.handles(ImageFormat::Svg));
        assert!(!chain.handles(ImageFormat::Png));
    }

    #[test]
    fn test_configure_merges_options() {
        let options = json!({ "optimizationLevel": 7 }).as_object().cloned().unwrap();
        assert_eq!(
            Stage::Gifsicle.configure(&options).unwrap(),
            ConfiguredStage::Gifsicle {
                level: 3,
                interlaced: false
            }
        );
        assert_eq!(
            Stage::Pngquant.configure(&CodecOptions::new()).unwrap(),
            ConfiguredStage::Pngquant {
                quality: (80, 90),
                speed: 4
            }
        );

        let bad = json!({ "quality": 0 }).as_object().cloned().unwrap();
        assert!(Stage::Mozjpeg.configure(&bad).is_err());
    }

    #[test]
    fn test_unhandled_format_passes_through() {
        let chain = ImageChain::with_defaults().unwrap();
        let input = b"BM not really a bitmap".to_vec();
        let (out, format) = chain.apply(ImageFormat::Bmp, input.clone()).unwrap();
        assert_eq!(out, input);
        assert_eq!(format, ImageFormat::Bmp);
    }

    #[test]
    fn test_webp_stops_png_stages() {
        let chain = ImageChain::new([
            (Stage::Webp, CodecOptions::new()),
            (Stage::Optipng, CodecOptions::new()),
        ])
        .unwrap();
        let (out, format) = chain.apply(ImageFormat::Png, png_fixture()).unwrap();
        assert_eq!(format, ImageFormat::Webp);
        assert_eq!(
            ::image::guess_format(&out).unwrap(),
            ::image::ImageFormat::WebP
        );
    }

    #[test]
    fn test_decode_failure_is_codec_error() {
        let chain = ImageChain::new([(Stage::Mozjpeg, CodecOptions::new())]).unwrap();
        let err = chain
            .apply(ImageFormat::Jpeg, b"not a jpeg".to_vec())
            .unwrap_err();
        assert!(matches!(err, CodecError::Image { codec: "mozjpeg", .. }));
    }
}
