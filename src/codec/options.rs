//! Opaque codec option bags.
//!
//! Options arrive as free-form tables (from `postpack.toml` or the library
//! API) and are passed through untouched until a codec reads them with
//! [`OptionReader`]. Keys are normalized to snake_case, so `optimizationLevel`
//! and `optimization_level` name the same option.

use std::ops::RangeInclusive;

use serde_json::{Map, Value};

use super::CodecError;

pub type CodecOptions = Map<String, Value>;

/// Merge caller options over built-in defaults. Caller keys win.
pub fn merge_options(defaults: CodecOptions, overrides: &CodecOptions) -> CodecOptions {
    let mut merged: CodecOptions = defaults
        .into_iter()
        .map(|(k, v)| (snake_case(&k), v))
        .collect();
    for (key, value) in overrides {
        merged.insert(snake_case(key), value.clone());
    }
    merged
}

/// Caller keys that no default names, i.e. keys the codec never reads.
///
/// Returned as written by the caller, in their original order.
pub fn unknown_options<'a>(defaults: &CodecOptions, overrides: &'a CodecOptions) -> Vec<&'a str> {
    overrides
        .keys()
        .filter(|key| {
            let key = snake_case(key);
            !defaults.keys().any(|known| snake_case(known) == key)
        })
        .map(String::as_str)
        .collect()
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '-' {
            out.push('_');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Typed access to an option bag on behalf of one codec.
pub struct OptionReader<'a> {
    codec: &'static str,
    options: &'a CodecOptions,
}

impl<'a> OptionReader<'a> {
    pub fn new(codec: &'static str, options: &'a CodecOptions) -> Self {
        Self { codec, options }
    }

    fn invalid(&self, key: &str, message: impl Into<String>) -> CodecError {
        CodecError::InvalidOption {
            codec: self.codec,
            key: key.to_string(),
            message: message.into(),
        }
    }

    pub fn uint(&self, key: &str, range: RangeInclusive<u64>, default: u64) -> Result<u64, CodecError> {
        let Some(value) = self.options.get(key) else {
            return Ok(default);
        };
        let n = value
            .as_u64()
            .ok_or_else(|| self.invalid(key, format!("expected an integer, got {value}")))?;
        if !range.contains(&n) {
            return Err(self.invalid(
                key,
                format!("{n} is outside {}..={}", range.start(), range.end()),
            ));
        }
        Ok(n)
    }

    /// A `[min, max]` pair of numbers within `range`, with `min <= max`.
    pub fn float_pair(
        &self,
        key: &str,
        range: RangeInclusive<f64>,
        default: (f64, f64),
    ) -> Result<(f64, f64), CodecError> {
        let Some(value) = self.options.get(key) else {
            return Ok(default);
        };
        let pair = match value.as_array().map(Vec::as_slice) {
            Some([a, b]) => a.as_f64().zip(b.as_f64()),
            _ => None,
        };
        let (min, max) =
            pair.ok_or_else(|| self.invalid(key, format!("expected [min, max], got {value}")))?;
        if !range.contains(&min) || !range.contains(&max) || min > max {
            return Err(self.invalid(
                key,
                format!(
                    "[{min}, {max}] must be ordered and within {}..={}",
                    range.start(),
                    range.end()
                ),
            ));
        }
        Ok((min, max))
    }

    pub fn boolean(&self, key: &str, default: bool) -> Result<bool, CodecError> {
        match self.options.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| self.invalid(key, format!("expected a boolean, got {value}"))),
        }
    }

    pub fn string(&self, key: &str, default: &'a str) -> Result<&'a str, CodecError> {
        match self.options.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_str()
                .ok_or_else(|| self.invalid(key, format!("expected a string, got {value}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> CodecOptions {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_merge_caller_wins() {
        let merged = merge_options(
            bag(json!({ "level": 9, "mode": "text" })),
            &bag(json!({ "level": 4 })),
        );
        assert_eq!(merged["level"], json!(4));
        assert_eq!(merged["mode"], json!("text"));
    }

    #[test]
    fn test_merge_normalizes_keys() {
        let merged = merge_options(
            bag(json!({ "optimization_level": 7 })),
            &bag(json!({ "optimizationLevel": 2 })),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged["optimization_level"], json!(2));
    }

    #[test]
    fn test_unknown_options() {
        let defaults = bag(json!({ "optimization_level": 3, "interlaced": false }));
        let overrides = bag(json!({ "optimizationLevel": 2, "levle": 3, "colors": 8 }));
        assert_eq!(unknown_options(&defaults, &overrides), ["levle", "colors"]);
        assert!(unknown_options(&bag(json!({})), &CodecOptions::new()).is_empty());
    }

    #[test]
    fn test_reader_ranges() {
        let options = bag(json!({ "level": 12, "quality": [0.8, 0.9], "flag": "yes" }));
        let reader = OptionReader::new("test", &options);

        assert!(reader.uint("level", 0..=9, 9).is_err());
        assert_eq!(reader.uint("missing", 0..=9, 6).unwrap(), 6);
        assert_eq!(
            reader.float_pair("quality", 0.0..=1.0, (0.0, 1.0)).unwrap(),
            (0.8, 0.9)
        );
        assert!(reader.boolean("flag", false).is_err());
    }

    #[test]
    fn test_reader_rejects_unordered_pair() {
        let options = bag(json!({ "quality": [0.9, 0.2] }));
        let reader = OptionReader::new("test", &options);
        assert!(reader.float_pair("quality", 0.0..=1.0, (0.0, 1.0)).is_err());
    }
}
