//! Count formatting for log lines.

/// Format count with noun: `0 files`, `1 file`, `5 files`.
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "file"), "0 files");
        assert_eq!(plural_count(1, "file"), "1 file");
        assert_eq!(plural_count(3, "image"), "3 images");
    }
}
