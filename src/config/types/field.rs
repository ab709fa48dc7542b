//! Config field paths.

/// Dotted path of a config field, e.g. `compress.threshold`.
///
/// Sections expose these as associated constants, so a diagnostic always
/// names its field the same way the TOML does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static str);

impl FieldPath {
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}
