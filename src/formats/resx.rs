//! .NET ResX resource files.
//!
//! A ResX document is a `<root>` holding schema, `<resheader>` elements and one
//! `<data name="...">` element per resource, with the text in a `<value>` child.
//! Reconstruction streams the original document through quick-xml and replaces
//! only the `<value>` text of translated entries, so everything else (schema,
//! comments, binary entries, whitespace) is written back untouched.

use quick_xml::{
    Reader, Writer,
    escape::partial_escape,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use std::fs;
use std::io::BufRead;
use std::path::Path;

use super::ResourceEntries;
use crate::errors::FormatError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// `type` prefixes of entries that hold binary or file-reference payloads
const NON_TEXT_TYPE_PREFIXES: &[&str] = &[
    "System.Drawing.Bitmap",
    "System.Drawing.Icon",
    "System.Byte[]",
    "System.Resources.ResXFileRef",
];

/// Parse the translatable entries of a ResX file
pub fn parse(path: &Path) -> Result<ResourceEntries, FormatError> {
    let content = fs::read(path).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes(&content).map_err(|message| FormatError::Xml {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse ResX content held in memory.
///
/// Entries with a binary type or a `mimetype` attribute are skipped, as are
/// entries with an empty name or an empty value.
pub fn parse_bytes(content: &[u8]) -> Result<ResourceEntries, String> {
    let body = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    let mut entries = ResourceEntries::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Start(e) if e.local_name().as_ref() == b"data" => {
                let attrs = DataAttributes::from_start(&e)?;
                let value = read_data_value(&mut reader)?;

                if attrs.is_non_text() {
                    continue;
                }
                match (attrs.name, value) {
                    (Some(name), Some(value)) if !name.is_empty() && !value.is_empty() => {
                        entries.insert(name, value);
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

/// Write `original_path` to `output_path` with translated values patched in.
///
/// Entries whose name is absent from `translated` keep their original text.
pub fn reconstruct(
    original_path: &Path,
    translated: &ResourceEntries,
    output_path: &Path,
) -> Result<(), FormatError> {
    let content = fs::read(original_path).map_err(|source| FormatError::Io {
        path: original_path.to_path_buf(),
        source,
    })?;
    let patched = patch_bytes(&content, translated).map_err(|message| FormatError::Xml {
        path: original_path.to_path_buf(),
        message,
    })?;
    fs::write(output_path, patched).map_err(|source| FormatError::Io {
        path: output_path.to_path_buf(),
        source,
    })
}

/// Replace the `<value>` text of every `<data>` element named in `translated`
pub fn patch_bytes(content: &[u8], translated: &ResourceEntries) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(content.len());
    let body = match content.strip_prefix(UTF8_BOM) {
        Some(rest) => {
            out.extend_from_slice(UTF8_BOM);
            rest
        }
        None => content,
    };
    let mut reader = Reader::from_reader(body);
    let mut writer = Writer::new(out);
    let mut buf = Vec::new();

    let mut in_data = false;
    // Nesting depth below the current <data>; 0 means direct children
    let mut depth = 0usize;
    // Translation still to be written for the current <data>
    let mut pending: Option<&str> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| e.to_string())?;
        match event {
            Event::Eof => break,
            Event::Start(e) => {
                let local = e.local_name().as_ref().to_vec();
                if !in_data && local == b"data" {
                    in_data = true;
                    depth = 0;
                    pending = DataAttributes::from_start(&e)?
                        .name
                        .and_then(|name| translated.get(&name));
                    write(&mut writer, Event::Start(e))?;
                } else if in_data && depth == 0 && local == b"value" && pending.is_some() {
                    let end = e.to_end().into_owned();
                    write(&mut writer, Event::Start(e))?;
                    if let Some(text) = pending.take() {
                        write(&mut writer, Event::Text(escaped_text(text)))?;
                    }
                    skip_element_content(&mut reader)?;
                    write(&mut writer, Event::End(end))?;
                } else {
                    if in_data {
                        depth += 1;
                    }
                    write(&mut writer, Event::Start(e))?;
                }
            }
            Event::End(e) => {
                if in_data {
                    if depth == 0 {
                        in_data = false;
                        pending = None;
                    } else {
                        depth -= 1;
                    }
                }
                write(&mut writer, Event::End(e))?;
            }
            Event::Empty(e) => {
                let is_value = in_data && depth == 0 && e.local_name().as_ref() == b"value";
                match pending.filter(|_| is_value) {
                    Some(text) => {
                        pending = None;
                        write_filled_value(&mut writer, &e, text)?;
                    }
                    None => write(&mut writer, Event::Empty(e))?,
                }
            }
            other => write(&mut writer, other)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

struct DataAttributes {
    name: Option<String>,
    type_name: Option<String>,
    mimetype: Option<String>,
}

impl DataAttributes {
    fn from_start(e: &BytesStart) -> Result<Self, String> {
        let mut attrs = Self {
            name: None,
            type_name: None,
            mimetype: None,
        };
        for attr in e.attributes().with_checks(false) {
            let attr = attr.map_err(|e| e.to_string())?;
            let value = || -> Result<String, String> {
                attr.unescape_value()
                    .map(|v| v.into_owned())
                    .map_err(|e| e.to_string())
            };
            match attr.key.as_ref() {
                b"name" => attrs.name = Some(value()?),
                b"type" => attrs.type_name = Some(value()?),
                b"mimetype" => attrs.mimetype = Some(value()?),
                _ => {}
            }
        }
        Ok(attrs)
    }

    fn is_non_text(&self) -> bool {
        self.mimetype.is_some()
            || self
                .type_name
                .as_deref()
                .is_some_and(|t| NON_TEXT_TYPE_PREFIXES.iter().any(|p| t.trim_start().starts_with(p)))
    }
}

/// Read the rest of a `<data>` element and return the text of its `<value>` child
fn read_data_value<R: BufRead>(reader: &mut Reader<R>) -> Result<Option<String>, String> {
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut in_value = false;
    let mut value: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Start(e) => {
                if depth == 0 && value.is_none() && e.local_name().as_ref() == b"value" {
                    in_value = true;
                    value = Some(String::new());
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 0 && value.is_none() && e.local_name().as_ref() == b"value" {
                    value = Some(String::new());
                }
            }
            Event::Text(t) if in_value => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if let Some(v) = value.as_mut() {
                    v.push_str(&text);
                }
            }
            Event::CData(c) if in_value => {
                let raw = c.into_inner();
                if let Some(v) = value.as_mut() {
                    v.push_str(&String::from_utf8_lossy(&raw));
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(value);
                }
                depth -= 1;
                if depth == 0 {
                    in_value = false;
                }
            }
            Event::Eof => return Err("unexpected end of document inside <data>".to_string()),
            _ => {}
        }
        buf.clear();
    }
}

/// Consume events up to and including the end tag of the element just opened
fn skip_element_content<R: BufRead>(reader: &mut Reader<R>) -> Result<(), String> {
    let mut buf = Vec::new();
    let mut depth = 0usize;
    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => return Ok(()),
            Event::End(_) => depth -= 1,
            Event::Eof => return Err("unexpected end of document inside <value>".to_string()),
            _ => {}
        }
        buf.clear();
    }
}

/// Expand `<value/>` into `<value>text</value>`
fn write_filled_value(
    writer: &mut Writer<Vec<u8>>,
    empty: &BytesStart,
    text: &str,
) -> Result<(), String> {
    let end: BytesEnd<'static> = empty.to_end().into_owned();
    write(writer, Event::Start(empty.clone()))?;
    write(writer, Event::Text(escaped_text(text)))?;
    write(writer, Event::End(end))
}

/// Escape only `<`, `>` and `&`, leaving quotes readable in element text
fn escaped_text(text: &str) -> BytesText<'_> {
    BytesText::from_escaped(partial_escape(text))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event) -> Result<(), String> {
    writer.write_event(event).map_err(|e| e.to_string())
}
