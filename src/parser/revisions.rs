//! Read-only extraction of `w:ins` / `w:del` records.

use crate::error::{Error, Result};
use crate::model::{RawRevisionRecord, Revisions};
use crate::wordml::{self, DELETED_TEXT, DEL, INS, TEXT};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WrapperKind {
    Insertion,
    Deletion,
}

impl WrapperKind {
    /// Local name of the text element collected for this wrapper.
    fn text_element(&self) -> &'static [u8] {
        match self {
            WrapperKind::Insertion => TEXT,
            WrapperKind::Deletion => DELETED_TEXT,
        }
    }
}

/// A wrapper that is still open while reading.
struct OpenRecord {
    kind: WrapperKind,
    record: RawRevisionRecord,
    /// Index among records of the same kind, keeps document order of starts
    slot: usize,
}

/// Extract insertion and deletion records from one XML part.
///
/// Text is the concatenation of `w:t` descendants for insertions and
/// `w:delText` descendants for deletions, trimmed. Records whose text is empty
/// are dropped.
pub fn extract_revisions(xml: &[u8]) -> Result<Revisions> {
    let mut reader = NsReader::from_reader(xml);

    let mut open: Vec<OpenRecord> = Vec::new();
    let mut insertions: Vec<Option<RawRevisionRecord>> = Vec::new();
    let mut deletions: Vec<Option<RawRevisionRecord>> = Vec::new();
    // Text element currently open, by kind
    let mut text_depth: Vec<WrapperKind> = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(Error::parse_at(reader.buffer_position() as u64, e.to_string()));
            }
        };

        match event {
            Event::Start(e) => {
                depth += 1;
                let in_wordml = resolves_to_wordml(reader.resolve_element(e.name()).0);
                let local = e.local_name();
                match wrapper_kind(in_wordml, local.as_ref()) {
                    Some(kind) => {
                        let slot = match kind {
                            WrapperKind::Insertion => {
                                insertions.push(None);
                                insertions.len() - 1
                            }
                            WrapperKind::Deletion => {
                                deletions.push(None);
                                deletions.len() - 1
                            }
                        };
                        open.push(OpenRecord {
                            kind,
                            record: read_attributes(&reader, &e)?,
                            slot,
                        });
                    }
                    None if in_wordml => {
                        for kind in [WrapperKind::Insertion, WrapperKind::Deletion] {
                            if local.as_ref() == kind.text_element() {
                                text_depth.push(kind);
                            }
                        }
                    }
                    None => {}
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                let in_wordml = resolves_to_wordml(reader.resolve_element(e.name()).0);
                let local = e.local_name();
                if let Some(kind) = wrapper_kind(in_wordml, local.as_ref()) {
                    if let Some(pos) = open.iter().rposition(|r| r.kind == kind) {
                        let finished = open.remove(pos);
                        let target = match finished.kind {
                            WrapperKind::Insertion => &mut insertions,
                            WrapperKind::Deletion => &mut deletions,
                        };
                        target[finished.slot] = finish_record(finished.record);
                    }
                } else if in_wordml {
                    if let Some(pos) = text_depth
                        .iter()
                        .rposition(|k| k.text_element() == local.as_ref())
                    {
                        text_depth.remove(pos);
                    }
                }
            }
            Event::Text(e) if !text_depth.is_empty() => {
                let text = e
                    .unescape()
                    .map_err(|err| Error::parse_at(reader.buffer_position() as u64, err.to_string()))?;
                append_text(&mut open, &text_depth, &text);
            }
            Event::CData(e) if !text_depth.is_empty() => {
                let text = std::str::from_utf8(&e)
                    .map_err(|err| Error::parse_at(reader.buffer_position() as u64, err.to_string()))?;
                append_text(&mut open, &text_depth, text);
            }
            Event::Eof if depth > 0 => {
                return Err(Error::parse_at(
                    reader.buffer_position() as u64,
                    format!("unexpected end of input with {} unclosed element(s)", depth),
                ));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let revisions = Revisions {
        insertions: insertions.into_iter().flatten().collect(),
        deletions: deletions.into_iter().flatten().collect(),
    };
    log::debug!(
        "extracted {} insertion(s) and {} deletion(s)",
        revisions.insertions.len(),
        revisions.deletions.len()
    );
    Ok(revisions)
}

fn resolves_to_wordml(ns: ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(ns) if wordml::is_wordml_namespace(ns.as_ref()))
}

fn wrapper_kind(in_wordml: bool, local: &[u8]) -> Option<WrapperKind> {
    if !in_wordml {
        return None;
    }
    match local {
        INS => Some(WrapperKind::Insertion),
        DEL => Some(WrapperKind::Deletion),
        _ => None,
    }
}

/// Text goes to every open wrapper whose text element is open.
fn append_text(open: &mut [OpenRecord], text_depth: &[WrapperKind], text: &str) {
    for record in open.iter_mut() {
        if text_depth.contains(&record.kind) {
            record.record.text.push_str(text);
        }
    }
}

fn finish_record(mut record: RawRevisionRecord) -> Option<RawRevisionRecord> {
    let trimmed = record.text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() != record.text.len() {
        record.text = trimmed.to_string();
    }
    Some(record)
}

/// Read `id`, `author` and `date`, accepting the WordprocessingML prefix or none.
fn read_attributes<R>(reader: &NsReader<R>, e: &BytesStart) -> Result<RawRevisionRecord> {
    let mut record = RawRevisionRecord::default();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Parse {
            position: None,
            reason: err.to_string(),
        })?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        let recognised = match ns {
            ResolveResult::Unbound => true,
            other => resolves_to_wordml(other),
        };
        if !recognised {
            continue;
        }
        let field = match local.as_ref() {
            b"id" => &mut record.id,
            b"author" => &mut record.author,
            b"date" => &mut record.date,
            _ => continue,
        };
        *field = attr
            .unescape_value()
            .map_err(|err| Error::Parse {
                position: None,
                reason: err.to_string(),
            })?
            .into_owned();
    }
    Ok(record)
}
