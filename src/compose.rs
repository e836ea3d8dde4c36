use std::cmp::Reverse;
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::Options;
use crate::error::ConvertError;
use crate::rewrite;
use crate::tree::{NodeId, SourceDocument, TextRange};

/// Committed replacements, keyed by the range they replace.
///
/// Keys sort by start and then by descending end, so for a given start the widest edit comes
/// first and the edits nested inside it follow.
#[derive(Debug, Clone, Default)]
pub struct EditMap {
    edits: BTreeMap<(usize, Reverse<usize>), String>,
}

impl EditMap {
    /// Creates an empty [`EditMap`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of committed edits that are not folded into a wider one.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Whether nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// The text of `range` in `source` with every committed edit inside it substituted.
    pub fn resolve(&self, source: &str, range: TextRange) -> String {
        let mut out = String::with_capacity(range.len());
        let mut cursor = range.start;
        for (&(start, Reverse(end)), text) in self.edits.range((range.start, Reverse(usize::MAX))..)
        {
            if start >= range.end {
                break;
            }
            if start < cursor || end > range.end {
                continue;
            }
            out.push_str(&source[cursor..start]);
            out.push_str(text);
            cursor = end;
        }
        out.push_str(&source[cursor..range.end]);
        out
    }

    /// Records `text` as the replacement of `range`.
    ///
    /// Edits nested inside `range` are dropped, since `text` was computed from their resolved
    /// form. An edit with the same range is replaced. Returns `Ok(false)` without recording
    /// anything when `range` lies inside a wider committed edit, whose text already fixed the
    /// content there.
    pub fn commit(&mut self, range: TextRange, text: String) -> Result<bool, ConvertError> {
        let key = (range.start, Reverse(range.end));

        // Stored edits are disjoint, so only the closest one to the left can reach into `range`.
        if let Some((&(start, Reverse(end)), _)) = self.edits.range(..key).next_back() {
            if end > range.start {
                if end >= range.end {
                    return Ok(false);
                }
                return Err(ConvertError::OverlappingEdit {
                    range,
                    other: TextRange::new(start, end),
                });
            }
        }

        let mut nested = Vec::new();
        for (&(start, Reverse(end)), _) in self.edits.range(key..) {
            if start >= range.end {
                break;
            }
            if end > range.end {
                return Err(ConvertError::OverlappingEdit {
                    range,
                    other: TextRange::new(start, end),
                });
            }
            nested.push((start, Reverse(end)));
        }
        for inner in nested {
            self.edits.remove(&inner);
        }

        self.edits.insert(key, text);
        Ok(true)
    }
}

/// Drives a single conversion: visits every node after its descendants and lets the rewriter
/// read node text through the edits committed so far.
pub struct Compositor<'a> {
    doc: &'a SourceDocument,
    edits: EditMap,
    options: Options,
}

impl<'a> Compositor<'a> {
    /// Creates a [`Compositor`] with no edits.
    pub fn new(doc: &'a SourceDocument, options: Options) -> Self {
        Self {
            doc,
            edits: EditMap::new(),
            options,
        }
    }

    /// The document being converted.
    pub fn document(&self) -> &'a SourceDocument {
        self.doc
    }

    /// The current text of a range: the original text with every committed edit inside it
    /// substituted.
    pub fn text(&self, range: TextRange) -> String {
        self.edits.resolve(self.doc.text(), range)
    }

    /// The current text of a node.
    pub fn node_text(&self, id: NodeId) -> String {
        self.text(self.doc.tree().node(id).range)
    }

    /// Commits a replacement for `range`. Replacements equal to the current text are skipped.
    pub fn commit(&mut self, range: TextRange, text: String) -> Result<(), ConvertError> {
        if self.text(range) == text {
            return Ok(());
        }
        if self.options.verbose {
            debug!(%range, replacement = %text, "committing edit");
        }
        if !self.edits.commit(range, text)? {
            warn!(%range, "edit lies inside an already rewritten node; skipped");
        }
        Ok(())
    }

    /// Visits every node, innermost first, and returns the rewritten document.
    pub fn run(mut self) -> Result<String, ConvertError> {
        let tree = self.doc.tree();
        let root = tree.root();

        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                rewrite::rewrite_node(&mut self, id)?;
                continue;
            }
            stack.push((id, true));
            for child in tree.node(id).children.iter().rev() {
                stack.push((*child, false));
            }
        }

        Ok(self.node_text(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: usize, end: usize) -> TextRange {
        TextRange::new(start, end)
    }

    #[test]
    fn resolve_without_edits() {
        let edits = EditMap::new();
        assert_eq!(edits.resolve("abcdef", range(1, 4)), "bcd");
    }

    #[test]
    fn inner_edits_are_visible_to_outer_ranges() {
        //            0123456789
        let source = "f(a, b) {}";
        let mut edits = EditMap::new();
        assert!(edits.commit(range(2, 3), "a: T".to_string()).unwrap());
        assert!(edits.commit(range(5, 6), "b: U".to_string()).unwrap());

        assert_eq!(edits.resolve(source, range(0, 10)), "f(a: T, b: U) {}");
        assert_eq!(edits.resolve(source, range(1, 7)), "(a: T, b: U)");
        assert_eq!(edits.resolve(source, range(3, 10)), ", b: U) {}");
    }

    #[test]
    fn outer_edit_folds_nested_edits() {
        let source = "f(a, b) {}";
        let mut edits = EditMap::new();
        edits.commit(range(2, 3), "a: T".to_string()).unwrap();
        let outer = format!("x{}", edits.resolve(source, range(0, 7)));
        edits.commit(range(0, 7), outer).unwrap();

        assert_eq!(edits.len(), 1);
        assert_eq!(edits.resolve(source, range(0, 10)), "xf(a: T, b) {}");
    }

    #[test]
    fn same_range_edit_is_replaced() {
        let mut edits = EditMap::new();
        edits.commit(range(0, 3), "one".to_string()).unwrap();
        edits.commit(range(0, 3), "two".to_string()).unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits.resolve("abcdef", range(0, 6)), "twodef");
    }

    #[test]
    fn edit_inside_committed_edit_is_refused() {
        let mut edits = EditMap::new();
        edits.commit(range(0, 6), "wide".to_string()).unwrap();
        assert!(!edits.commit(range(2, 3), "narrow".to_string()).unwrap());
        assert_eq!(edits.resolve("abcdef", range(0, 6)), "wide");
    }

    #[test]
    fn partial_overlap_is_an_error() {
        let mut edits = EditMap::new();
        edits.commit(range(2, 5), "x".to_string()).unwrap();
        assert!(matches!(
            edits.commit(range(3, 8), "y".to_string()),
            Err(ConvertError::OverlappingEdit { .. })
        ));
        assert!(matches!(
            edits.commit(range(0, 4), "z".to_string()),
            Err(ConvertError::OverlappingEdit { .. })
        ));
    }

    #[test]
    fn commits_are_checked_against_the_closest_edit_on_the_left() {
        let mut edits = EditMap::new();
        edits.commit(range(0, 2), "a".to_string()).unwrap();
        edits.commit(range(3, 5), "b".to_string()).unwrap();
        edits.commit(range(10, 12), "c".to_string()).unwrap();

        assert!(!edits.commit(range(4, 5), "inside b".to_string()).unwrap());
        assert!(edits.commit(range(6, 8), "d".to_string()).unwrap());
        assert!(matches!(
            edits.commit(range(1, 3), "e".to_string()),
            Err(ConvertError::OverlappingEdit { other, .. }) if other == range(0, 2)
        ));
        assert!(edits.commit(range(5, 9), "wraps d".to_string()).unwrap());
        assert_eq!(edits.len(), 4);
        assert_eq!(
            edits.resolve("0123456789abcdef", range(0, 16)),
            "a2bwraps d9cdef"
        );
    }

    #[test]
    fn empty_replacement() {
        let mut edits = EditMap::new();
        edits.commit(range(0, 5), String::new()).unwrap();
        assert_eq!(edits.resolve("/*c*/ f()", range(0, 9)), " f()");
    }
}
