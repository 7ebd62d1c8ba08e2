//! Reader for the XML comment container:
//!
//! ```xml
//! <i>
//!   <d p="12.5,1,25,16777215,..." user="name">comment text</d>
//! </i>
//! ```
//!
//! Only `<d>` elements matter; everything else is skipped. Record-level
//! problems are left to the normalizer, but a file that is not well-formed XML
//! fails as a whole.

use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::comment::RawRecord;
use super::error::{LayoutError, Result};

const COMMENT_TAG: &[u8] = b"d";

fn decode_error(message: impl Into<String>) -> LayoutError {
    LayoutError::UpstreamDecodeFailure(message.into())
}

pub fn load_comment_file(path: &Path) -> Result<Vec<RawRecord>> {
    let bytes = fs::read(path)
        .map_err(|e| decode_error(format!("cannot read {}: {e}", path.display())))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| decode_error(format!("{} is not valid UTF-8: {e}", path.display())))?;
    parse_comment_xml(&text)
}

pub fn parse_comment_xml(xml: &str) -> Result<Vec<RawRecord>> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);

    let mut records = Vec::new();
    let mut current: Option<RawRecord> = None;
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            decode_error(format!("malformed XML at byte {}: {e}", reader.error_position()))
        })?;

        match event {
            Event::Start(start) => {
                depth += 1;
                saw_root = true;
                if start.name().as_ref() == COMMENT_TAG {
                    let mut record = record_from_attributes(&start)?;
                    record.text = Some(String::new());
                    current = Some(record);
                }
            }
            Event::Empty(start) => {
                saw_root = true;
                if start.name().as_ref() == COMMENT_TAG {
                    records.push(record_from_attributes(&start)?);
                }
            }
            Event::Text(text) => {
                if let Some(record) = current.as_mut() {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| decode_error(format!("bad entity in comment text: {e}")))?;
                    record.text.get_or_insert_with(String::new).push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(record) = current.as_mut() {
                    let chunk = std::str::from_utf8(&data)
                        .map_err(|e| decode_error(format!("CDATA is not UTF-8: {e}")))?;
                    record.text.get_or_insert_with(String::new).push_str(chunk);
                }
            }
            Event::End(end) => {
                depth = depth.saturating_sub(1);
                if end.name().as_ref() == COMMENT_TAG {
                    if let Some(record) = current.take() {
                        records.push(record);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(decode_error("no root element found"));
    }
    if depth != 0 {
        return Err(decode_error("unexpected end of document inside an element"));
    }

    Ok(records)
}

fn record_from_attributes(start: &BytesStart<'_>) -> Result<RawRecord> {
    let mut record = RawRecord::default();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| decode_error(format!("bad attribute: {e}")))?;
        let value = attr
            .unescape_value()
            .map_err(|e| decode_error(format!("bad attribute value: {e}")))?;
        match attr.key.as_ref() {
            b"p" => record.attributes = value.into_owned(),
            b"user" => record.author = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok(record)
}
