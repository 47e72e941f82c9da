/*!
 * Minimal ASCII DXF reader and writer.
 *
 * A DXF file is a flat list of group code / value line pairs. The document
 * keeps every pair exactly as read and only interprets what the walker
 * needs: section and block boundaries, and the text fields of TEXT, MTEXT,
 * ATTDEF, ATTRIB and DIMENSION entities. Everything else is written back
 * untouched.
 *
 * Text values may carry `\U+XXXX` escapes. They are decoded to UTF-16 code
 * units, so an escaped lone surrogate survives as data until cleaned.
 */

use log::debug;

use crate::document::{Container, ElementInfo, ElementKind, ElementRef, HostDocument};
use crate::errors::{ParseError, SerializeError, WriteBackError};
use crate::text::RawText;

/// Longest MTEXT chunk stored in one group value
pub const MTEXT_CHUNK_CHARS: usize = 250;

const ENTITY_TYPE: i32 = 0;
const PRIMARY_TEXT: i32 = 1;
const NAME: i32 = 2;
const TEXT_CHUNK: i32 = 3;
const LAYER: i32 = 8;
const PAPER_SPACE: i32 = 67;
const LAYOUT_NAME: i32 = 410;

#[derive(Debug, Clone, PartialEq)]
struct Pair {
    /// Group code line as read, kept for verbatim output
    code_line: String,
    code: i32,
    value: String,
}

impl Pair {
    fn new(code: i32, value: impl Into<String>) -> Self {
        Self {
            code_line: format!("{:>3}", code),
            code,
            value: value.into(),
        }
    }
}

/// Pairs from one code-0 marker up to the next
#[derive(Debug, Clone, Default)]
struct Record {
    pairs: Vec<Pair>,
}

impl Record {
    fn entity_type(&self) -> &str {
        self.pairs
            .first()
            .filter(|p| p.code == ENTITY_TYPE)
            .map(|p| p.value.trim())
            .unwrap_or("")
    }

    fn first(&self, code: i32) -> Option<&str> {
        self.pairs.iter().find(|p| p.code == code).map(|p| p.value.as_str())
    }
}

#[derive(Debug, Clone)]
struct TextEntity {
    record: usize,
    kind: ElementKind,
    container: Container,
    layer: String,
}

/// Parsed ASCII DXF drawing
#[derive(Debug, Clone)]
pub struct DxfDocument {
    records: Vec<Record>,
    elements: Vec<TextEntity>,
    line_ending: &'static str,
}

impl DxfDocument {
    /// Parse decoded DXF text
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let line_ending = if text.contains("\r\n") { "\r\n" } else { "\n" };

        let mut lines: Vec<&str> = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();
        if lines.last() == Some(&"") {
            lines.pop();
        }
        if lines.is_empty() {
            return Err(ParseError { line: 1, message: "empty document".to_string() });
        }
        if lines.len() % 2 != 0 {
            return Err(ParseError {
                line: lines.len(),
                message: "group code without a value".to_string(),
            });
        }

        let mut records: Vec<Record> = Vec::new();
        for (index, chunk) in lines.chunks(2).enumerate() {
            let code = chunk[0].trim().parse::<i32>().map_err(|_| ParseError {
                line: index * 2 + 1,
                message: format!("invalid group code '{}'", chunk[0].trim()),
            })?;
            let pair = Pair {
                code_line: chunk[0].to_string(),
                code,
                value: chunk[1].to_string(),
            };
            match records.last_mut() {
                Some(record) if code != ENTITY_TYPE => record.pairs.push(pair),
                _ => records.push(Record { pairs: vec![pair] }),
            }
        }

        if records.last().map(Record::entity_type) != Some("EOF") {
            return Err(ParseError {
                line: lines.len(),
                message: "missing EOF marker".to_string(),
            });
        }

        let elements = index_text_entities(&records);
        debug!("Parsed DXF: {} records, {} text elements", records.len(), elements.len());
        Ok(Self { records, elements, line_ending })
    }

    /// Serialize to DXF text
    pub fn to_dxf_string(&self) -> Result<String, SerializeError> {
        let mut out = String::new();
        for (index, record) in self.records.iter().enumerate() {
            for pair in &record.pairs {
                if pair.value.contains(['\n', '\r']) {
                    return Err(SerializeError::RejectedValue {
                        location: format!("record {} ({}), group {}", index, record.entity_type(), pair.code),
                        reason: "line break inside a group value".to_string(),
                    });
                }
                out.push_str(&pair.code_line);
                out.push_str(self.line_ending);
                out.push_str(&pair.value);
                out.push_str(self.line_ending);
            }
        }
        Ok(out)
    }

    pub fn element(&self, element: ElementRef) -> Option<ElementInfo> {
        self.elements.get(element.0).map(|e| ElementInfo {
            id: element,
            kind: e.kind,
            container: e.container.clone(),
            layer: e.layer.clone(),
        })
    }

    fn entity(&self, element: ElementRef) -> Result<&TextEntity, WriteBackError> {
        self.elements
            .get(element.0)
            .ok_or_else(|| WriteBackError::MissingElement(element.to_string()))
    }
}

impl HostDocument for DxfDocument {
    fn text_elements(&self) -> Vec<ElementInfo> {
        (0..self.elements.len())
            .filter_map(|i| self.element(ElementRef(i)))
            .collect()
    }

    fn read_text(&self, element: ElementRef) -> Result<RawText, WriteBackError> {
        let entity = self.entity(element)?;
        let record = &self.records[entity.record];
        let value = match entity.kind {
            ElementKind::MText => {
                let mut value: String = record
                    .pairs
                    .iter()
                    .filter(|p| p.code == TEXT_CHUNK)
                    .map(|p| p.value.as_str())
                    .collect();
                value.push_str(record.first(PRIMARY_TEXT).unwrap_or(""));
                value
            }
            _ => record.first(PRIMARY_TEXT).unwrap_or("").to_string(),
        };
        Ok(decode_escapes(&value))
    }

    fn write_text(&mut self, element: ElementRef, value: &str) -> Result<(), WriteBackError> {
        let entity = self.entity(element)?.clone();
        if value.contains(['\n', '\r']) {
            return Err(WriteBackError::Rejected {
                element: element.to_string(),
                reason: "line breaks cannot be stored in a group value".to_string(),
            });
        }

        let record = &mut self.records[entity.record];
        let primary = record.pairs.iter().position(|p| p.code == PRIMARY_TEXT);

        match entity.kind {
            ElementKind::MText => {
                let chunks = split_chunks(value, MTEXT_CHUNK_CHARS);
                let (last, leading) = chunks.split_last().map(|(l, rest)| (l.clone(), rest.to_vec())).unwrap_or_default();
                record.pairs.retain(|p| p.code != TEXT_CHUNK);
                let at = match record.pairs.iter().position(|p| p.code == PRIMARY_TEXT) {
                    Some(at) => {
                        record.pairs[at].value = last;
                        at
                    }
                    None => {
                        record.pairs.push(Pair::new(PRIMARY_TEXT, last));
                        record.pairs.len() - 1
                    }
                };
                for (offset, chunk) in leading.into_iter().enumerate() {
                    record.pairs.insert(at + offset, Pair::new(TEXT_CHUNK, chunk));
                }
            }
            ElementKind::Dimension if primary.is_none() => {
                // no override: the drawing shows the measured value
                return Err(WriteBackError::ReadOnly {
                    element: element.to_string(),
                    kind: entity.kind.to_string(),
                });
            }
            _ => match primary {
                Some(at) => record.pairs[at].value = value.to_string(),
                None => record.pairs.push(Pair::new(PRIMARY_TEXT, value)),
            },
        }
        Ok(())
    }
}

fn index_text_entities(records: &[Record]) -> Vec<TextEntity> {
    let mut elements = Vec::new();
    let mut section: Option<String> = None;
    let mut block: Option<Container> = None;

    for (index, record) in records.iter().enumerate() {
        match record.entity_type() {
            "SECTION" => section = record.first(NAME).map(|s| s.trim().to_uppercase()),
            "ENDSEC" => {
                section = None;
                block = None;
            }
            "BLOCK" if section.as_deref() == Some("BLOCKS") => {
                block = Some(block_container(record.first(NAME).unwrap_or("").trim()));
            }
            "ENDBLK" => block = None,
            entity_type => {
                let Some(kind) = ElementKind::from_entity_type(entity_type) else {
                    continue;
                };
                let container = match (section.as_deref(), &block) {
                    (Some("ENTITIES"), _) => entity_container(record),
                    (Some("BLOCKS"), Some(block)) => block.clone(),
                    _ => continue,
                };
                let layer = record
                    .first(LAYER)
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| "0".to_string());
                elements.push(TextEntity { record: index, kind, container, layer });
            }
        }
    }
    elements
}

/// Model and paper space blocks are layouts, not reusable blocks
fn block_container(name: &str) -> Container {
    let upper = name.to_uppercase();
    if upper.starts_with("*MODEL_SPACE") {
        Container::ModelSpace
    } else if upper.starts_with("*PAPER_SPACE") {
        Container::Layout(name.to_string())
    } else {
        Container::Block(name.to_string())
    }
}

fn entity_container(record: &Record) -> Container {
    let layout = record.first(LAYOUT_NAME).map(str::trim).filter(|l| !l.is_empty());
    if record.first(PAPER_SPACE).map(str::trim) == Some("1") {
        return Container::Layout(layout.unwrap_or("Paper").to_string());
    }
    match layout {
        Some(name) if !name.eq_ignore_ascii_case("Model") => Container::Layout(name.to_string()),
        _ => Container::ModelSpace,
    }
}

/// Decode `\U+XXXX` escapes into UTF-16 code units
pub fn decode_escapes(value: &str) -> RawText {
    let mut units: Vec<u16> = Vec::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find("\\U+") {
        let (head, tail) = rest.split_at(pos);
        units.extend(head.encode_utf16());
        let unit = tail
            .get(3..7)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .and_then(|hex| u16::from_str_radix(hex, 16).ok());
        match unit {
            Some(unit) => {
                units.push(unit);
                rest = &tail[7..];
            }
            None => {
                units.extend("\\U+".encode_utf16());
                rest = &tail[3..];
            }
        }
    }
    units.extend(rest.encode_utf16());
    RawText::from_utf16(units)
}

fn split_chunks(value: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = value.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}
