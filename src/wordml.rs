//! WordprocessingML names and revision-markup classification.

/// Transitional WordprocessingML main namespace.
pub const W_NAMESPACE: &[u8] = b"http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Strict WordprocessingML main namespace.
pub const W_STRICT_NAMESPACE: &[u8] = b"http://purl.oclc.org/ooxml/wordprocessingml/main";

/// Local name of the insertion wrapper.
pub const INS: &[u8] = b"ins";

/// Local name of the deletion wrapper.
pub const DEL: &[u8] = b"del";

/// Local name of text runs inside insertions and ordinary content.
pub const TEXT: &[u8] = b"t";

/// Local name of text runs inside deletions.
pub const DELETED_TEXT: &[u8] = b"delText";

const MOVE_FROM: &[u8] = b"moveFrom";
const MOVE_TO: &[u8] = b"moveTo";
const BOOKKEEPING_SUFFIX: &[u8] = b"Change";
const RANGE_KINDS: [&[u8]; 6] = [b"Del", b"Ins", b"moveFrom", b"moveTo", b"MoveFrom", b"MoveTo"];

/// How the acceptance transform treats an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementPolicy {
    /// Drop the element and its whole subtree
    DeleteSubtree,
    /// Drop revision history bookkeeping and its subtree
    PurgeBookkeeping,
    /// Drop only the start and end tags
    Unwrap,
    /// Emit unchanged
    PassThrough,
}

impl ElementPolicy {
    /// Whether this element's subtree is discarded.
    pub fn discards(&self) -> bool {
        matches!(self, ElementPolicy::DeleteSubtree | ElementPolicy::PurgeBookkeeping)
    }
}

/// Check whether a resolved namespace is WordprocessingML main.
pub fn is_wordml_namespace(ns: &[u8]) -> bool {
    ns == W_NAMESPACE || ns == W_STRICT_NAMESPACE
}

/// Classify an element by namespace and local name.
pub fn classify(in_wordml: bool, local: &[u8]) -> ElementPolicy {
    if !in_wordml {
        return ElementPolicy::PassThrough;
    }
    match local {
        DEL | MOVE_FROM => ElementPolicy::DeleteSubtree,
        INS | MOVE_TO => ElementPolicy::Unwrap,
        _ if is_bookkeeping(local) || is_range_marker(local) => ElementPolicy::PurgeBookkeeping,
        _ => ElementPolicy::PassThrough,
    }
}

/// Whether a local name is one of the plain `ins`/`del` wrappers.
pub fn is_plain_wrapper(local: &[u8]) -> bool {
    local == INS || local == DEL
}

/// Property-change records such as `rPrChange` or `sectPrChange`.
fn is_bookkeeping(local: &[u8]) -> bool {
    local.len() > BOOKKEEPING_SUFFIX.len() && local.ends_with(BOOKKEEPING_SUFFIX)
}

/// Range boundaries of deletions, insertions and moves, e.g. `moveFromRangeStart`
/// or `customXmlDelRangeEnd`. Bookmark and comment ranges do not match.
fn is_range_marker(local: &[u8]) -> bool {
    let stem = if let Some(stem) = local.strip_suffix(b"RangeStart") {
        stem
    } else if let Some(stem) = local.strip_suffix(b"RangeEnd") {
        stem
    } else {
        return false;
    };
    RANGE_KINDS.iter().any(|kind| stem.ends_with(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_wrappers() {
        assert_eq!(classify(true, b"del"), ElementPolicy::DeleteSubtree);
        assert_eq!(classify(true, b"moveFrom"), ElementPolicy::DeleteSubtree);
        assert_eq!(classify(true, b"ins"), ElementPolicy::Unwrap);
        assert_eq!(classify(true, b"moveTo"), ElementPolicy::Unwrap);
        assert_eq!(classify(true, b"p"), ElementPolicy::PassThrough);
    }

    #[test]
    fn test_classify_requires_wordml_namespace() {
        assert_eq!(classify(false, b"del"), ElementPolicy::PassThrough);
        assert_eq!(classify(false, b"rPrChange"), ElementPolicy::PassThrough);
    }

    #[test]
    fn test_classify_bookkeeping() {
        for name in [
            &b"rPrChange"[..],
            b"pPrChange",
            b"sectPrChange",
            b"tblGridChange",
            b"numberingChange",
        ] {
            assert_eq!(classify(true, name), ElementPolicy::PurgeBookkeeping);
        }
        assert_eq!(classify(true, b"Change"), ElementPolicy::PassThrough);
    }

    #[test]
    fn test_classify_range_markers() {
        for name in [
            &b"moveFromRangeStart"[..],
            b"moveFromRangeEnd",
            b"moveToRangeStart",
            b"moveToRangeEnd",
            b"customXmlDelRangeStart",
            b"customXmlInsRangeEnd",
            b"customXmlMoveFromRangeStart",
            b"customXmlMoveToRangeEnd",
        ] {
            assert_eq!(classify(true, name), ElementPolicy::PurgeBookkeeping);
        }
        assert_eq!(classify(true, b"bookmarkStart"), ElementPolicy::PassThrough);
        assert_eq!(classify(true, b"commentRangeStart"), ElementPolicy::PassThrough);
        assert_eq!(classify(true, b"permStart"), ElementPolicy::PassThrough);
    }

    #[test]
    fn test_policy_discards() {
        assert!(ElementPolicy::DeleteSubtree.discards());
        assert!(ElementPolicy::PurgeBookkeeping.discards());
        assert!(!ElementPolicy::Unwrap.discards());
        assert!(!ElementPolicy::PassThrough.discards());
    }
}
