//! SVG minification at the XML level.
//!
//! The document is streamed through quick-xml and written back with
//! comments, `<metadata>` and indentation removed, and with numbers in
//! geometry attributes rounded. Elements are never rebuilt, so text,
//! scripts, links and classes survive untouched.

use std::borrow::Cow;

use quick_xml::{
    Reader, Writer,
    events::{BytesStart, Event, attributes::Attribute},
    name::QName,
};

use crate::codec::CodecError;

use super::raster::smaller_of;

const CODEC: &str = "svgo";

/// Attributes whose values are numbers, lists of numbers or path data.
const NUMERIC_ATTRS: &[&[u8]] = &[
    b"x",
    b"y",
    b"x1",
    b"y1",
    b"x2",
    b"y2",
    b"cx",
    b"cy",
    b"dx",
    b"dy",
    b"fx",
    b"fy",
    b"r",
    b"rx",
    b"ry",
    b"width",
    b"height",
    b"d",
    b"points",
    b"viewBox",
    b"transform",
    b"gradientTransform",
    b"patternTransform",
    b"offset",
    b"opacity",
    b"fill-opacity",
    b"stroke-opacity",
    b"stroke-width",
    b"stroke-dasharray",
    b"stroke-dashoffset",
];

/// Elements whose whitespace-only text is significant.
const PRESERVE_WHITESPACE: &[&[u8]] = &[b"text", b"tspan", b"textPath", b"style", b"script"];

pub fn minify(input: &[u8], precision: u8) -> Result<Vec<u8>, CodecError> {
    let mut reader = Reader::from_reader(input);
    let mut writer = Writer::new(Vec::with_capacity(input.len()));

    // one entry per open element: does it preserve whitespace
    let mut open: Vec<bool> = Vec::new();
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            CodecError::failed(
                CODEC,
                format!("failed to parse SVG at {}: {e}", reader.error_position()),
            )
        })?;

        match event {
            Event::Eof => break,
            Event::Comment(_) => {}
            Event::Start(elem) if elem.local_name().as_ref() == b"metadata" => {
                let end = elem.name().as_ref().to_vec();
                reader
                    .read_to_end(QName(&end))
                    .map_err(|e| CodecError::failed(CODEC, format!("unclosed <metadata>: {e}")))?;
            }
            Event::Empty(elem) if elem.local_name().as_ref() == b"metadata" => {}
            Event::Start(elem) => {
                check_root(&elem, &mut seen_root)?;
                let preserve =
                    open.last().copied().unwrap_or(false) || preserves_whitespace(&elem);
                open.push(preserve);
                write(&mut writer, Event::Start(compact(&elem, precision)?))?;
            }
            Event::Empty(elem) => {
                check_root(&elem, &mut seen_root)?;
                write(&mut writer, Event::Empty(compact(&elem, precision)?))?;
            }
            Event::End(elem) => {
                open.pop();
                write(&mut writer, Event::End(elem))?;
            }
            Event::Text(text)
                if !open.last().copied().unwrap_or(false)
                    && text.iter().all(u8::is_ascii_whitespace) => {}
            other => write(&mut writer, other)?,
        }
    }

    if !seen_root {
        return Err(CodecError::failed(CODEC, "no <svg> element found"));
    }
    if !open.is_empty() {
        return Err(CodecError::failed(CODEC, "unexpected end of document"));
    }

    Ok(smaller_of(input, writer.into_inner()))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), CodecError> {
    writer
        .write_event(event)
        .map_err(|e| CodecError::failed(CODEC, e.to_string()))
}

fn check_root(elem: &BytesStart<'_>, seen_root: &mut bool) -> Result<(), CodecError> {
    if *seen_root {
        return Ok(());
    }
    if elem.local_name().as_ref() != b"svg" {
        let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
        return Err(CodecError::failed(
            CODEC,
            format!("root element is <{name}>, not <svg>"),
        ));
    }
    *seen_root = true;
    Ok(())
}

fn preserves_whitespace(elem: &BytesStart<'_>) -> bool {
    PRESERVE_WHITESPACE.contains(&elem.local_name().as_ref())
        || elem.attributes().flatten().any(|attr| {
            attr.key.as_ref() == b"xml:space" && attr.value.as_ref() == b"preserve"
        })
}

/// Same element, same attributes in the same order; numeric values rounded.
fn compact<'a>(elem: &'a BytesStart<'a>, precision: u8) -> Result<BytesStart<'a>, CodecError> {
    let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);

    for attr in elem.attributes() {
        let attr = attr.map_err(|e| CodecError::failed(CODEC, format!("bad attribute: {e}")))?;
        let value: Cow<'_, [u8]> = if NUMERIC_ATTRS.contains(&attr.key.as_ref()) {
            Cow::Owned(round_numbers(&attr.value, precision))
        } else {
            attr.value
        };
        // values are re-emitted inside double quotes
        let value = if value.contains(&b'"') {
            Cow::Owned(replace_quotes(&value))
        } else {
            value
        };
        out.push_attribute(Attribute {
            key: attr.key,
            value,
        });
    }
    Ok(out)
}

fn replace_quotes(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len() + 8);
    for &b in value {
        if b == b'"' {
            out.extend_from_slice(b"&quot;");
        } else {
            out.push(b);
        }
    }
    out
}

/// Round every decimal in `value` to `precision` fraction digits.
///
/// Whitespace runs collapse to one space. Numbers with an exponent are
/// copied as written.
fn round_numbers(value: &[u8], precision: u8) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::with_capacity(value.len());
    let mut i = 0;

    while i < value.len() {
        let b = value[i];

        if b.is_ascii_whitespace() {
            while i < value.len() && value[i].is_ascii_whitespace() {
                i += 1;
            }
            if !out.is_empty() && i < value.len() {
                out.push(b' ');
            }
            continue;
        }

        let starts_number = b.is_ascii_digit()
            || (matches!(b, b'-' | b'.') && value.get(i + 1).is_some_and(u8::is_ascii_digit))
            || (b == b'-'
                && value.get(i + 1) == Some(&b'.')
                && value.get(i + 2).is_some_and(u8::is_ascii_digit));
        if !starts_number {
            out.push(b);
            i += 1;
            continue;
        }

        let start = i;
        if value[i] == b'-' {
            i += 1;
        }
        while i < value.len() && value[i].is_ascii_digit() {
            i += 1;
        }
        let mut has_fraction = false;
        if i < value.len() && value[i] == b'.' {
            has_fraction = true;
            i += 1;
            while i < value.len() && value[i].is_ascii_digit() {
                i += 1;
            }
        }
        let token = &value[start..i];

        let has_exponent = value.get(i).is_some_and(|c| matches!(c, b'e' | b'E'))
            && value
                .get(i + 1)
                .is_some_and(|c| c.is_ascii_digit() || matches!(c, b'-' | b'+'));
        if !has_fraction || has_exponent {
            out.extend_from_slice(token);
            continue;
        }

        let rounded = std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .map(|n| format_rounded(n, precision));
        match rounded {
            Some(text) => {
                // "1.5.0001" must not become "1.50"
                if text.as_bytes()[0].is_ascii_digit()
                    && out.last().is_some_and(|c| c.is_ascii_digit() || *c == b'.')
                {
                    out.push(b' ');
                }
                out.extend_from_slice(text.as_bytes());
            }
            None => out.extend_from_slice(token),
        }
    }
    out
}

fn format_rounded(n: f64, precision: u8) -> String {
    let text = format!("{:.*}", usize::from(precision), n);
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICON: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!-- exported by an editor -->
<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">
    <!-- generated by a vector editor; this comment and the metadata below are dropped on export, padding the file well past what the shapes need -->
    <metadata>editor state: layers=1 zoom=1 guides=none selection=none snapping=on grid=off</metadata>
    <g>
        <rect x="10.123456" y="10.987654" width="80" height="80" fill="#ff0000"/>
    </g>
</svg>
"##;

    fn minify_str(input: &str) -> String {
        String::from_utf8(minify(input.as_bytes(), 3).unwrap()).unwrap()
    }

    #[test]
    fn test_minify_shrinks() {
        let text = minify_str(ICON);
        assert!(text.len() < ICON.len());
        assert!(text.contains("<svg"));
        assert!(!text.contains("exported by an editor"));
        assert!(!text.contains("metadata"));
        assert!(text.contains(r##"<rect x="10.123" y="10.988" width="80" height="80" fill="#ff0000"/>"##));
    }

    #[test]
    fn test_minify_keeps_text_and_structure() {
        let input = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="200" height="50">
    <!-- a caption -->
    <style>.label { font: 12px sans-serif; }</style>
    <rect class="bg" width="200.000001" height="50" fill="#eee"/>
    <a xlink:href="https://example.com">
        <text x="10" y="30" class="label">Hello <tspan font-weight="bold">World</tspan></text>
    </a>
    <script>console.log("hi")</script>
</svg>"##;
        let text = minify_str(input);

        assert!(text.len() < input.len());
        assert!(text.contains(r#"<text x="10" y="30" class="label">Hello <tspan font-weight="bold">World</tspan></text>"#));
        assert!(text.contains(r##"<rect class="bg" width="200" height="50" fill="#eee"/>"##));
        assert!(text.contains(r#"xlink:href="https://example.com""#));
        assert!(text.contains("<style>.label { font: 12px sans-serif; }</style>"));
        assert!(text.contains("<script>"));
        assert!(!text.contains("<path"));
        assert!(!text.contains("a caption"));
    }

    #[test]
    fn test_whitespace_kept_inside_text() {
        let input = r#"<svg xmlns="http://www.w3.org/2000/svg"><text><tspan>A</tspan> <tspan>B</tspan></text>

</svg>"#;
        let text = minify_str(input);
        assert!(text.contains("<tspan>A</tspan> <tspan>B</tspan>"));
        assert!(text.ends_with("</text></svg>"));
    }

    #[test]
    fn test_round_numbers() {
        assert_eq!(round_numbers(b"M10.123456 -0.5e-3 L1.5.0001", 3), b"M10.123 -0.5e-3 L1.5 0");
        assert_eq!(round_numbers(b"  0   0\n 100.0004  50 ", 3), b"0 0 100 50");
        assert_eq!(round_numbers(b"translate(-1.23456,7)", 2), b"translate(-1.23,7)");
        assert_eq!(round_numbers(b"100%", 3), b"100%");
    }

    #[test]
    fn test_single_quoted_value_stays_valid() {
        let input = r#"<svg xmlns="http://www.w3.org/2000/svg">
    <!-- long enough to pay for the escaped quotes below -->
    <text font-family='"Fira Sans", serif'>x</text>  </svg>"#;
        let text = minify_str(input);
        assert!(text.contains(r#"font-family="&quot;Fira Sans&quot;, serif""#));
    }

    #[test]
    fn test_minify_rejects_garbage() {
        let err = minify(b"<html></html>", 3).unwrap_err();
        assert!(matches!(err, CodecError::Failed { codec: "svgo", .. }));

        let err = minify(b"<svg><g></svg>", 3).unwrap_err();
        assert!(matches!(err, CodecError::Failed { codec: "svgo", .. }));

        assert!(minify(b"just text", 3).is_err());
    }
}
