//! Revision acceptance for a single WordprocessingML XML part.
//!
//! The transform is a single streaming pass over the part:
//!
//! - `w:del` and `w:moveFrom` subtrees are removed,
//! - `w:ins` and `w:moveTo` wrappers are dropped but their content kept,
//! - property-change records (`w:rPrChange`, ...) and move/custom-XML range
//!   markers are removed,
//! - everything else is copied through byte for byte.
//!
//! Namespace declarations made on an unwrapped wrapper are re-declared on the
//! surviving elements that still need them.
//!
//! # Example
//!
//! ```
//! use untrack::accept::{accept_revisions, AcceptOptions};
//!
//! let xml = br#"<w:p xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:ins><w:r><w:t>new</w:t></w:r></w:ins><w:del><w:r><w:delText>old</w:delText></w:r></w:del></w:p>"#;
//! let result = accept_revisions(xml, &AcceptOptions::default())?;
//! let cleaned = String::from_utf8(result.xml).unwrap();
//! assert!(cleaned.contains("new"));
//! assert!(!cleaned.contains("old"));
//! # Ok::<(), untrack::Error>(())
//! ```

mod state;

use crate::error::{Error, Result};
use crate::wordml;
use quick_xml::events::Event;
use quick_xml::name::{QName, ResolveResult};
use quick_xml::NsReader;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use state::{RevisionCounts, TransformState};

/// Options for accepting revisions in one XML part.
#[derive(Debug, Clone, Default)]
pub struct AcceptOptions {
    /// Report leftover revision markup other than plain insertions/deletions
    pub collect_warnings: bool,
}

impl AcceptOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable warning collection.
    pub fn with_warnings(mut self, collect: bool) -> Self {
        self.collect_warnings = collect;
        self
    }
}

/// Count of one kind of revision element found in a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionWarning {
    /// Qualified element name as first seen, e.g. `w:moveFrom`
    pub element: String,
    /// Number of occurrences, including those inside removed content
    pub count: usize,
}

/// Cleaned XML plus optional warnings.
#[derive(Debug, Clone)]
pub struct AcceptResult {
    /// The rewritten part
    pub xml: Vec<u8>,
    /// Revision elements found, sorted by descending count (empty unless requested)
    pub warnings: Vec<RevisionWarning>,
}

/// Accept every tracked change in one XML part.
///
/// Returns the rewritten bytes, or an error without any partial output.
pub fn accept_revisions(xml: &[u8], options: &AcceptOptions) -> Result<AcceptResult> {
    let (output, counts) = guarded(|| transform(xml))?;
    let warnings = if options.collect_warnings {
        counts.into_warnings(false)
    } else {
        Vec::new()
    };

    log::debug!(
        "accepted revisions: {} -> {} bytes, {} warning(s)",
        xml.len(),
        output.len(),
        warnings.len()
    );

    Ok(AcceptResult {
        xml: output,
        warnings,
    })
}

/// Count every revision element in a part, `ins` and `del` included.
pub fn count_revision_elements(xml: &[u8]) -> Result<Vec<RevisionWarning>> {
    let (_, counts) = guarded(|| transform(xml))?;
    Ok(counts.into_warnings(true))
}

/// Run the transform, turning a panic into [`Error::Internal`].
fn guarded<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("revision transform panicked: {}", message);
            Err(Error::Internal(message))
        }
    }
}

fn transform(xml: &[u8]) -> Result<(Vec<u8>, RevisionCounts)> {
    let prolog_len = prolog_len(xml);
    let mut state = TransformState::with_prolog(&xml[..prolog_len], xml.len());
    let mut reader = NsReader::from_reader(&xml[prolog_len..]);

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                let position = (prolog_len + reader.buffer_position()) as u64;
                return Err(Error::parse_at(position, e.to_string()));
            }
        };

        match event {
            Event::Start(e) => {
                let in_wordml = is_wordml(&reader, e.name());
                state.start(&e, in_wordml, false)?;
            }
            Event::Empty(e) => {
                let in_wordml = is_wordml(&reader, e.name());
                state.start(&e, in_wordml, true)?;
            }
            Event::End(e) => {
                let in_wordml = is_wordml(&reader, e.name());
                state.end(&e, in_wordml)?;
            }
            Event::Text(e) => state.emit_raw(b"", &e, b""),
            Event::CData(e) => state.emit_raw(b"<![CDATA[", &e, b"]]>"),
            Event::Comment(e) => state.emit_raw(b"<!--", &e, b"-->"),
            Event::PI(e) => state.emit_raw(b"<?", &e, b"?>"),
            Event::DocType(e) => state.emit_raw(b"<!DOCTYPE ", &e, b">"),
            Event::Decl(e) => state.emit_raw(b"<?", &e, b"?>"),
            Event::Eof => break,
        }
    }

    state.finish()
}

fn is_wordml<R>(reader: &NsReader<R>, name: QName) -> bool {
    match reader.resolve_element(name).0 {
        ResolveResult::Bound(ns) => wordml::is_wordml_namespace(ns.as_ref()),
        _ => false,
    }
}

/// Length of the leading BOM, XML declaration and following whitespace.
///
/// The prolog is copied to the output verbatim instead of being re-serialized.
fn prolog_len(xml: &[u8]) -> usize {
    static PROLOG: OnceLock<Regex> = OnceLock::new();
    let re = PROLOG.get_or_init(|| {
        Regex::new(r"(?-u)\A(?:\xEF\xBB\xBF)?<\?xml[^>]*\?>[ \t\r\n]*").expect("valid prolog regex")
    });
    re.find(xml).map(|m| m.end()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    fn accept(xml: &str) -> String {
        let result = accept_revisions(xml.as_bytes(), &AcceptOptions::default()).unwrap();
        String::from_utf8(result.xml).unwrap()
    }

    #[test]
    fn test_prolog_len() {
        assert_eq!(prolog_len(b"<root/>"), 0);
        let xml = b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n<root/>";
        assert_eq!(prolog_len(xml), xml.len() - b"<root/>".len());
        let bom = b"\xEF\xBB\xBF<?xml version=\"1.0\"?><root/>";
        assert_eq!(prolog_len(bom), bom.len() - b"<root/>".len());
    }

    #[test]
    fn test_passthrough_is_verbatim() {
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <w:document xmlns:w=\"{W}\" w:x='1'><!-- c --><?pi data?>\
             <w:body><w:p><w:r><w:t xml:space=\"preserve\"> a &amp; b &lt; c </w:t></w:r>\
             <w:r><w:t><![CDATA[<raw & cdata>]]></w:t></w:r><w:br /></w:p></w:body></w:document>"
        );
        assert_eq!(accept(&xml), xml);
    }

    #[test]
    fn test_unwrap_and_delete() {
        let xml = format!(
            "<w:p xmlns:w=\"{W}\"><w:r><w:t>Keep</w:t></w:r>\
             <w:ins w:id=\"1\"><w:r><w:t>Added</w:t></w:r></w:ins>\
             <w:del w:id=\"2\"><w:r><w:delText>Gone</w:delText></w:r></w:del></w:p>"
        );
        assert_eq!(
            accept(&xml),
            format!("<w:p xmlns:w=\"{W}\"><w:r><w:t>Keep</w:t></w:r><w:r><w:t>Added</w:t></w:r></w:p>")
        );
    }

    #[test]
    fn test_moves() {
        let xml = format!(
            "<w:body xmlns:w=\"{W}\">\
             <w:moveFromRangeStart w:id=\"1\" w:name=\"m\"/>\
             <w:moveFrom><w:r><w:t>Old place</w:t></w:r></w:moveFrom>\
             <w:moveFromRangeEnd w:id=\"1\"/>\
             <w:moveToRangeStart w:id=\"2\" w:name=\"m\"/>\
             <w:moveTo><w:r><w:t>New place</w:t></w:r></w:moveTo>\
             <w:moveToRangeEnd w:id=\"2\"/></w:body>"
        );
        assert_eq!(
            accept(&xml),
            format!("<w:body xmlns:w=\"{W}\"><w:r><w:t>New place</w:t></w:r></w:body>")
        );
    }

    #[test]
    fn test_bookkeeping_removed() {
        let xml = format!(
            "<w:r xmlns:w=\"{W}\"><w:rPr><w:b/>\
             <w:rPrChange w:id=\"3\"><w:rPr><w:i/></w:rPr></w:rPrChange></w:rPr>\
             <w:t>x</w:t></w:r>"
        );
        assert_eq!(
            accept(&xml),
            format!("<w:r xmlns:w=\"{W}\"><w:rPr><w:b/></w:rPr><w:t>x</w:t></w:r>")
        );
    }

    #[test]
    fn test_nested_deletions() {
        let xml = format!(
            "<w:p xmlns:w=\"{W}\"><w:del><w:del><w:r><w:delText>a</w:delText></w:r></w:del>\
             <w:r><w:delText>b</w:delText></w:r></w:del><w:r><w:t>c</w:t></w:r></w:p>"
        );
        assert_eq!(
            accept(&xml),
            format!("<w:p xmlns:w=\"{W}\"><w:r><w:t>c</w:t></w:r></w:p>")
        );
    }

    #[test]
    fn test_insertion_inside_deletion_is_removed() {
        let xml = format!(
            "<w:p xmlns:w=\"{W}\"><w:del><w:ins><w:r><w:t>x</w:t></w:r></w:ins></w:del></w:p>"
        );
        assert_eq!(accept(&xml), format!("<w:p xmlns:w=\"{W}\"></w:p>"));
    }

    #[test]
    fn test_other_namespace_untouched() {
        let xml = "<root xmlns:o=\"urn:other\"><o:del>stay</o:del><del>stay too</del></root>";
        assert_eq!(accept(xml), xml);
    }

    #[test]
    fn test_orphan_namespace_redeclared() {
        let xml = format!(
            "<w:p xmlns:w=\"{W}\"><w:ins xmlns:x=\"urn:x\"><w:r x:a=\"1\"><x:t>t</x:t></w:r>\
             <w:r><w:t>u</w:t></w:r></w:ins></w:p>"
        );
        assert_eq!(
            accept(&xml),
            format!(
                "<w:p xmlns:w=\"{W}\"><w:r x:a=\"1\" xmlns:x=\"urn:x\"><x:t>t</x:t></w:r>\
                 <w:r xmlns:x=\"urn:x\"><w:t>u</w:t></w:r></w:p>"
            )
        );
    }

    #[test]
    fn test_orphan_namespace_not_duplicated() {
        let xml = format!(
            "<root xmlns:x=\"urn:x\"><w:ins xmlns:w=\"{W}\" xmlns:x=\"urn:x\"><x:a/></w:ins></root>"
        );
        // x is already bound to the same URI, only w has to be rescued
        assert_eq!(
            accept(&xml),
            format!("<root xmlns:x=\"urn:x\"><x:a xmlns:w=\"{W}\"/></root>")
        );
    }

    #[test]
    fn test_orphan_shadowed_by_own_declaration() {
        let xml = format!(
            "<w:p xmlns:w=\"{W}\"><w:ins xmlns:x=\"urn:one\"><a xmlns:x=\"urn:two\"><x:b/></a></w:ins></w:p>"
        );
        assert_eq!(
            accept(&xml),
            format!("<w:p xmlns:w=\"{W}\"><a xmlns:x=\"urn:two\"><x:b/></a></w:p>")
        );
    }

    #[test]
    fn test_orphan_scope_ends_with_wrapper() {
        let xml = format!(
            "<w:p xmlns:w=\"{W}\"><w:ins xmlns:x=\"urn:x\"><x:a/></w:ins><w:r/></w:p>"
        );
        assert_eq!(
            accept(&xml),
            format!("<w:p xmlns:w=\"{W}\"><x:a xmlns:x=\"urn:x\"/><w:r/></w:p>")
        );
    }

    #[test]
    fn test_warnings() {
        let xml = format!(
            "<w:body xmlns:w=\"{W}\"><w:p><w:pPr><w:pPrChange/></w:pPr>\
             <w:moveFromRangeStart/><w:moveFromRangeStart/>\
             <w:ins><w:r/></w:ins><w:del/><w:del/></w:p></w:body>"
        );
        let result =
            accept_revisions(xml.as_bytes(), &AcceptOptions::new().with_warnings(true)).unwrap();
        assert_eq!(
            result.warnings,
            vec![
                RevisionWarning {
                    element: "w:moveFromRangeStart".into(),
                    count: 2
                },
                RevisionWarning {
                    element: "w:pPrChange".into(),
                    count: 1
                },
            ]
        );

        let quiet = accept_revisions(xml.as_bytes(), &AcceptOptions::default()).unwrap();
        assert!(quiet.warnings.is_empty());
    }

    #[test]
    fn test_counts_inside_discarded_content() {
        let xml = format!(
            "<w:p xmlns:w=\"{W}\"><w:del><w:r><w:rPr><w:rPrChange/></w:rPr></w:r></w:del></w:p>"
        );
        let counts = count_revision_elements(xml.as_bytes()).unwrap();
        assert!(counts.contains(&RevisionWarning {
            element: "w:rPrChange".into(),
            count: 1
        }));
        assert!(counts.contains(&RevisionWarning {
            element: "w:del".into(),
            count: 1
        }));
    }

    #[test]
    fn test_parse_errors() {
        let options = AcceptOptions::default();
        assert!(matches!(
            accept_revisions(b"<a><b></a>", &options),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            accept_revisions(b"<a><b>", &options),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            accept_revisions(b"", &options),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            accept_revisions(b"<?xml version=\"1.0\"?>\n", &options),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_guarded_catches_panics() {
        let result: Result<()> = guarded(|| panic!("boom"));
        match result {
            Err(Error::Internal(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
