//! `[image]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [image]
//! disable = false
//! filter = '(?i)\.(png|jpeg|gif|jpg|bmp|svg)$'
//! verbose = true
//! gifsicle = true                          # Built-in defaults
//! mozjpeg = { quality = 60 }               # Enabled with options
//! pngquant = false                         # Disabled
//! optipng = { optimizationLevel = 5 }      # camelCase keys work too
//! svgo = true
//! webp = false
//! jpegtran = { progressive = true }
//! ```
//!
//! Stages left out keep their default: `gifsicle`, `svgo` and `jpegtran`
//! run, the rest do not.

use serde::{Deserialize, Serialize};

use crate::codec::image::{ImageChain, Stage};
use crate::codec::{CodecError, CodecOptions, unknown_options};
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::scan::PathFilter;

pub const DEFAULT_IMAGE_FILTER: &str = r"(?i)\.(png|jpeg|gif|jpg|bmp|svg)$";

/// `true`/`false`, or an options table that also enables the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageSetting {
    Enabled(bool),
    Options(CodecOptions),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub disable: bool,
    pub filter: String,
    pub verbose: bool,
    pub gifsicle: Option<StageSetting>,
    pub mozjpeg: Option<StageSetting>,
    pub pngquant: Option<StageSetting>,
    pub optipng: Option<StageSetting>,
    pub svgo: Option<StageSetting>,
    pub webp: Option<StageSetting>,
    pub jpegtran: Option<StageSetting>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            disable: false,
            filter: DEFAULT_IMAGE_FILTER.to_string(),
            verbose: true,
            gifsicle: None,
            mozjpeg: None,
            pngquant: None,
            optipng: None,
            svgo: None,
            webp: None,
            jpegtran: None,
        }
    }
}

impl ImageConfig {
    pub const FILTER: FieldPath = FieldPath::new("image.filter");

    const fn stage_field(stage: Stage) -> FieldPath {
        FieldPath::new(match stage {
            Stage::Gifsicle => "image.gifsicle",
            Stage::Mozjpeg => "image.mozjpeg",
            Stage::Pngquant => "image.pngquant",
            Stage::Optipng => "image.optipng",
            Stage::Svgo => "image.svgo",
            Stage::Webp => "image.webp",
            Stage::Jpegtran => "image.jpegtran",
        })
    }

    fn setting(&self, stage: Stage) -> Option<&StageSetting> {
        match stage {
            Stage::Gifsicle => self.gifsicle.as_ref(),
            Stage::Mozjpeg => self.mozjpeg.as_ref(),
            Stage::Pngquant => self.pngquant.as_ref(),
            Stage::Optipng => self.optipng.as_ref(),
            Stage::Svgo => self.svgo.as_ref(),
            Stage::Webp => self.webp.as_ref(),
            Stage::Jpegtran => self.jpegtran.as_ref(),
        }
    }

    /// Enabled stages with their caller options, in chain order.
    pub fn enabled_stages(&self) -> Vec<(Stage, CodecOptions)> {
        Stage::ORDER
            .into_iter()
            .filter_map(|stage| match self.setting(stage) {
                None if stage.enabled_by_default() => Some((stage, CodecOptions::new())),
                None | Some(StageSetting::Enabled(false)) => None,
                Some(StageSetting::Enabled(true)) => Some((stage, CodecOptions::new())),
                Some(StageSetting::Options(options)) => Some((stage, options.clone())),
            })
            .collect()
    }

    pub fn path_filter(&self) -> Result<PathFilter, regex::Error> {
        PathFilter::pattern(&self.filter)
    }

    pub fn chain(&self) -> Result<ImageChain, CodecError> {
        ImageChain::new(self.enabled_stages())
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.disable {
            return;
        }

        if let Err(e) = self.path_filter() {
            diag.error(Self::FILTER, format!("invalid pattern: {e}"));
        }

        // Per stage, so every bad table is reported, not just the first.
        for (stage, options) in self.enabled_stages() {
            if let Err(e) = stage.configure(&options) {
                diag.error(Self::stage_field(stage), e.to_string());
            }
            for key in unknown_options(&stage.default_options(), &options) {
                diag.warn(
                    Self::stage_field(stage),
                    format!("`{key}` is not a `{}` option, ignoring", stage.name()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::image::ConfiguredStage;
    use crate::config::test_parse_config;

    #[test]
    fn test_image_defaults() {
        let config = test_parse_config("");
        let stages: Vec<_> = config
            .image
            .enabled_stages()
            .into_iter()
            .map(|(s, _)| s)
            .collect();
        assert_eq!(stages, [Stage::Gifsicle, Stage::Svgo, Stage::Jpegtran]);
        assert!(config.image.verbose);
    }

    #[test]
    fn test_stage_settings() {
        let config = test_parse_config(
            "[image]\ngifsicle = false\nmozjpeg = { quality = 60 }\nwebp = true",
        );
        let stages = config.image.enabled_stages();
        let names: Vec<_> = stages.iter().map(|(s, _)| *s).collect();
        assert_eq!(names, [Stage::Mozjpeg, Stage::Svgo, Stage::Webp, Stage::Jpegtran]);

        let chain = config.image.chain().unwrap();
        assert_eq!(chain.stages().count(), 4);
        assert_eq!(
            Stage::Mozjpeg.configure(&stages[0].1).unwrap(),
            ConfiguredStage::Mozjpeg { quality: 60 }
        );
    }

    #[test]
    fn test_validate_reports_each_stage() {
        let config = test_parse_config(
            "[image]\nmozjpeg = { quality = 500 }\npngquant = { speed = \"fast\" }\nfilter = \"(\"",
        );
        let mut diag = ConfigDiagnostics::new();
        config.image.validate(&mut diag);
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn test_unread_stage_options_warn() {
        let config = test_parse_config(
            "[image]\nwebp = { quality = 75 }\noptipng = { optimizationLevel = 5, levle = 2 }",
        );
        let mut diag = ConfigDiagnostics::new();
        config.image.validate(&mut diag);
        assert!(!diag.has_errors());
        let warnings: Vec<_> = diag.warnings().map(ToString::to_string).collect();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("image.webp") && w.contains("quality")));
        assert!(warnings.iter().any(|w| w.contains("image.optipng") && w.contains("levle")));
    }
}
