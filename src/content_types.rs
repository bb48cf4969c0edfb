//! `[Content_Types].xml` handling
//!
//! Package archives declare a media type for every file extension they
//! contain. Delta updates add files with extensions a plain package never
//! has, so a release package must declare those up front.

use crate::{Error, Result};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashSet;

/// File name of the content-type manifest at the archive root
pub const CONTENT_TYPES_FILE: &str = "[Content_Types].xml";

/// Extensions (and media types) every release package must declare
pub const DELTA_CONTENT_TYPES: &[(&str, &str)] = &[
    ("diff", "application/octet"),
    ("bsdiff", "application/octet"),
    ("exe", "application/octet"),
    ("dll", "application/octet"),
    ("shasum", "text/plain"),
];

const EMPTY_TYPES: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\"></Types>";

/// A content-type manifest with no declarations
pub fn empty_content_types() -> &'static str {
    EMPTY_TYPES
}

/// Add a `Default` declaration for each delta extension the document lacks
///
/// Extensions are compared case-insensitively; existing declarations are
/// never changed, so merging twice gives the same document.
pub fn merge_delta_content_types(xml: &str) -> Result<String> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let existing = declared_extensions(xml)?;

    let missing: Vec<(&str, &str)> = DELTA_CONTENT_TYPES
        .iter()
        .copied()
        .filter(|(ext, _)| !existing.contains(*ext))
        .collect();

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    write_defaults(&mut writer, &missing)?;
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Empty(e) if depth == 0 => {
                // <Types/> has to be opened up to take children
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                writer.write_event(Event::Start(e))?;
                write_defaults(&mut writer, &missing)?;
                writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::InvalidContentTypes(format!("not UTF-8 after merge: {}", e)))
}

/// Lowercased extensions of the `Default` declarations under the `Types` root
fn declared_extensions(xml: &str) -> Result<HashSet<String>> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut extensions = HashSet::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth == 0 {
                    check_root(&e)?;
                    seen_root = true;
                } else if depth == 1 {
                    collect_extension(&e, &mut extensions)?;
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 0 {
                    check_root(&e)?;
                    seen_root = true;
                } else if depth == 1 {
                    collect_extension(&e, &mut extensions)?;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(Error::InvalidContentTypes("document has no root element".to_string()));
    }

    Ok(extensions)
}

fn check_root(e: &BytesStart<'_>) -> Result<()> {
    let name = e.local_name();
    if name.as_ref().eq_ignore_ascii_case(b"types") {
        Ok(())
    } else {
        Err(Error::InvalidContentTypes(format!(
            "expected root node 'Types', found '{}'",
            String::from_utf8_lossy(name.as_ref())
        )))
    }
}

fn collect_extension(e: &BytesStart<'_>, extensions: &mut HashSet<String>) -> Result<()> {
    if !e.local_name().as_ref().eq_ignore_ascii_case(b"default") {
        return Ok(());
    }
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref().eq_ignore_ascii_case(b"extension") {
            extensions.insert(attr.unescape_value()?.to_ascii_lowercase());
        }
    }
    Ok(())
}

fn write_defaults(writer: &mut Writer<Vec<u8>>, defaults: &[(&str, &str)]) -> Result<()> {
    for (extension, content_type) in defaults {
        let mut element = BytesStart::new("Default");
        element.push_attribute(("Extension", *extension));
        element.push_attribute(("ContentType", *content_type));
        writer.write_event(Event::Empty(element))?;
    }
    Ok(())
}
