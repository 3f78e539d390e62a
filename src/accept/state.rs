//! Running state of one acceptance pass.
//!
//! The state is owned by a single call to [`super::accept_revisions`] and
//! updated in place as the reader produces events. Only bytes that survive
//! acceptance ever reach `output`.

use crate::error::{Error, Result};
use crate::wordml::{self, ElementPolicy};
use quick_xml::events::{BytesEnd, BytesStart};
use std::collections::BTreeMap;

use super::RevisionWarning;

/// A namespace declaration. An empty prefix is the default namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NsBinding {
    prefix: Vec<u8>,
    uri: String,
}

/// A declaration in force in the input document.
///
/// `orphan` is set when the declaring element was unwrapped, so the binding
/// only survives in the output if someone re-declares it.
#[derive(Debug, Clone)]
struct ScopeEntry {
    binding: NsBinding,
    orphan: bool,
}

/// Bookkeeping for one open element outside discarded content.
#[derive(Debug, Clone, Copy)]
struct Frame {
    emitted: bool,
    scope_len: usize,
    declared_len: usize,
}

#[derive(Debug, Clone)]
struct RevisionCount {
    qualified_name: String,
    count: usize,
}

/// Per-local-name counts of revision markup, keyed by local name.
#[derive(Debug, Clone, Default)]
pub(crate) struct RevisionCounts(BTreeMap<Vec<u8>, RevisionCount>);

impl RevisionCounts {
    fn record(&mut self, qname: &[u8], local: &[u8]) {
        self.0
            .entry(local.to_vec())
            .or_insert_with(|| RevisionCount {
                qualified_name: String::from_utf8_lossy(qname).into_owned(),
                count: 0,
            })
            .count += 1;
    }

    /// Counts sorted by descending count, optionally without `ins`/`del`.
    pub(crate) fn into_warnings(self, include_plain_wrappers: bool) -> Vec<RevisionWarning> {
        let mut warnings: Vec<RevisionWarning> = self
            .0
            .into_iter()
            .filter(|(local, _)| include_plain_wrappers || !wordml::is_plain_wrapper(local))
            .map(|(_, c)| RevisionWarning {
                element: c.qualified_name,
                count: c.count,
            })
            .collect();
        warnings.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.element.cmp(&b.element)));
        warnings
    }
}

/// Mutable state threaded through the event loop.
pub(crate) struct TransformState {
    /// Nesting of discarded elements; content is emitted only at zero.
    skip_depth: usize,
    /// Declarations carried by the start tag being processed.
    pending_namespaces: Vec<NsBinding>,
    /// Declarations in force in the input, orphans flagged.
    scope: Vec<ScopeEntry>,
    /// Declarations in force in the output.
    declared: Vec<NsBinding>,
    frames: Vec<Frame>,
    open_elements: usize,
    seen_root: bool,
    output: Vec<u8>,
    revision_counts: RevisionCounts,
}

impl TransformState {
    /// Create a state whose output starts with the document prolog.
    pub(crate) fn with_prolog(prolog: &[u8], capacity: usize) -> Self {
        let mut output = Vec::with_capacity(capacity);
        output.extend_from_slice(prolog);
        Self {
            skip_depth: 0,
            pending_namespaces: Vec::new(),
            scope: Vec::new(),
            declared: Vec::new(),
            frames: Vec::new(),
            open_elements: 0,
            seen_root: false,
            output,
            revision_counts: RevisionCounts::default(),
        }
    }

    /// Handle a start tag, or an empty-element tag when `empty` is set.
    pub(crate) fn start(&mut self, e: &BytesStart, in_wordml: bool, empty: bool) -> Result<()> {
        let local_name = e.local_name();
        let local = local_name.as_ref();
        let policy = wordml::classify(in_wordml, local);

        if policy != ElementPolicy::PassThrough {
            self.revision_counts.record(e.name().as_ref(), local);
        }
        self.seen_root = true;
        if !empty {
            self.open_elements += 1;
        }

        if self.skip_depth > 0 {
            if policy.discards() && !empty {
                self.skip_depth += 1;
            }
            return Ok(());
        }

        match policy {
            ElementPolicy::DeleteSubtree | ElementPolicy::PurgeBookkeeping => {
                log::trace!("discarding <{}>", String::from_utf8_lossy(e.name().as_ref()));
                if !empty {
                    self.skip_depth = 1;
                }
            }
            ElementPolicy::Unwrap => {
                log::trace!("unwrapping <{}>", String::from_utf8_lossy(e.name().as_ref()));
                self.collect_declarations(e)?;
                let frame = self.frame(false);
                let pending = std::mem::take(&mut self.pending_namespaces);
                self.scope.extend(pending.into_iter().map(|binding| ScopeEntry {
                    binding,
                    orphan: true,
                }));
                self.push_or_close(frame, empty);
            }
            ElementPolicy::PassThrough => {
                self.collect_declarations(e)?;
                let frame = self.frame(true);
                let rescued = self.rescued_namespaces();
                self.write_start_tag(e, &rescued, empty);

                let pending = std::mem::take(&mut self.pending_namespaces);
                self.declared.extend(pending.iter().cloned());
                self.declared.extend(rescued);
                self.scope.extend(pending.into_iter().map(|binding| ScopeEntry {
                    binding,
                    orphan: false,
                }));
                self.push_or_close(frame, empty);
            }
        }
        Ok(())
    }

    /// Handle an end tag.
    pub(crate) fn end(&mut self, e: &BytesEnd, in_wordml: bool) -> Result<()> {
        if self.open_elements == 0 {
            return Err(Error::Parse {
                position: None,
                reason: format!(
                    "unmatched end tag </{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                ),
            });
        }
        self.open_elements -= 1;

        if self.skip_depth > 0 {
            if wordml::classify(in_wordml, e.local_name().as_ref()).discards() {
                self.skip_depth -= 1;
            }
            return Ok(());
        }

        let frame = self
            .frames
            .pop()
            .ok_or_else(|| Error::Internal("end tag without an open element frame".into()))?;
        if frame.emitted {
            self.output.extend_from_slice(b"</");
            self.output.extend_from_slice(e.name().as_ref());
            self.output.push(b'>');
        }
        self.close(frame);
        Ok(())
    }

    /// Copy raw markup (text, comment, CDATA, PI) unless inside discarded content.
    pub(crate) fn emit_raw(&mut self, open: &[u8], content: &[u8], close: &[u8]) {
        if self.skip_depth > 0 {
            return;
        }
        self.output.extend_from_slice(open);
        self.output.extend_from_slice(content);
        self.output.extend_from_slice(close);
    }

    /// Finish the pass, checking the document was complete.
    pub(crate) fn finish(self) -> Result<(Vec<u8>, RevisionCounts)> {
        if self.open_elements > 0 {
            return Err(Error::Parse {
                position: None,
                reason: format!(
                    "unexpected end of input with {} unclosed element(s)",
                    self.open_elements
                ),
            });
        }
        if !self.seen_root {
            return Err(Error::Parse {
                position: None,
                reason: "document has no root element".to_string(),
            });
        }
        Ok((self.output, self.revision_counts))
    }

    fn frame(&self, emitted: bool) -> Frame {
        Frame {
            emitted,
            scope_len: self.scope.len(),
            declared_len: self.declared.len(),
        }
    }

    fn push_or_close(&mut self, frame: Frame, empty: bool) {
        if empty {
            self.close(frame);
        } else {
            self.frames.push(frame);
        }
    }

    /// End the namespace scope of an element: drop exactly what it pushed.
    fn close(&mut self, frame: Frame) {
        self.scope.truncate(frame.scope_len);
        self.declared.truncate(frame.declared_len);
    }

    fn collect_declarations(&mut self, e: &BytesStart) -> Result<()> {
        self.pending_namespaces.clear();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::Parse {
                position: None,
                reason: err.to_string(),
            })?;
            let key = attr.key.as_ref();
            let prefix = if key == b"xmlns" {
                Vec::new()
            } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
                prefix.to_vec()
            } else {
                continue;
            };
            let uri = attr.unescape_value().map_err(|err| Error::Parse {
                position: None,
                reason: err.to_string(),
            })?;
            self.pending_namespaces.push(NsBinding {
                prefix,
                uri: uri.into_owned(),
            });
        }
        Ok(())
    }

    /// Orphaned declarations the next emitted element has to carry.
    ///
    /// Only the innermost binding of each prefix counts; prefixes the element
    /// declares itself, or that the output already binds to the same URI, are
    /// skipped.
    fn rescued_namespaces(&self) -> Vec<NsBinding> {
        let mut seen: Vec<&[u8]> = self
            .pending_namespaces
            .iter()
            .map(|b| b.prefix.as_slice())
            .collect();
        let mut rescued = Vec::new();

        for entry in self.scope.iter().rev() {
            let prefix = entry.binding.prefix.as_slice();
            if seen.contains(&prefix) {
                continue;
            }
            seen.push(prefix);
            if entry.orphan && !self.output_binds(prefix, &entry.binding.uri) {
                rescued.push(entry.binding.clone());
            }
        }
        rescued.reverse();
        rescued
    }

    fn output_binds(&self, prefix: &[u8], uri: &str) -> bool {
        match self.declared.iter().rev().find(|b| b.prefix == prefix) {
            Some(binding) => binding.uri == uri,
            None => prefix.is_empty() && uri.is_empty(),
        }
    }

    fn write_start_tag(&mut self, e: &BytesStart, rescued: &[NsBinding], empty: bool) {
        self.output.push(b'<');
        self.output.extend_from_slice(e);
        for binding in rescued {
            self.output.extend_from_slice(b" xmlns");
            if !binding.prefix.is_empty() {
                self.output.push(b':');
                self.output.extend_from_slice(&binding.prefix);
            }
            self.output.extend_from_slice(b"=\"");
            self.output
                .extend_from_slice(escape_attribute(&binding.uri).as_bytes());
            self.output.push(b'"');
        }
        let close: &[u8] = if empty { b"/>" } else { b">" };
        self.output.extend_from_slice(close);
    }
}

/// Escape an attribute value: `&`, `<`, `>`, `"` and `'`.
pub(crate) fn escape_attribute(value: &str) -> std::borrow::Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return std::borrow::Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    std::borrow::Cow::Owned(escaped)
}
