use tracing::trace;

use crate::tree::{Comment, CommentId, NodeId, NodeKind, SourceDocument};

/// The ancestors that may carry a node's documentation, in the order they are tried. Each step
/// only applies when the previous node's parent has the given kind.
#[derive(Debug, Clone, Copy)]
enum Ancestor {
    Assignment,
    Declarator,
    Declaration,
    Property,
}

const ANCESTOR_CHAIN: [Ancestor; 4] = [
    Ancestor::Assignment,
    Ancestor::Declarator,
    Ancestor::Declaration,
    Ancestor::Property,
];

impl Ancestor {
    fn matches(self, kind: &NodeKind) -> bool {
        match self {
            Ancestor::Assignment => matches!(kind, NodeKind::AssignmentExpression),
            Ancestor::Declarator => matches!(kind, NodeKind::VariableDeclarator { .. }),
            Ancestor::Declaration => matches!(kind, NodeKind::VariableDeclaration),
            Ancestor::Property => matches!(kind, NodeKind::Property { .. }),
        }
    }
}

/// Finds the comments that document a node, in source order. An empty result means no comment
/// documents it.
///
/// Comments the parser attached to the node itself win, then those attached to the node's name,
/// then those attached to an enclosing assignment, declarator, declaration or property. Only when
/// none of these carry comments is the nearest preceding comment used, and only if nothing but
/// whitespace separates it from the node.
pub fn resolve(doc: &SourceDocument, id: NodeId) -> Vec<CommentId> {
    let tree = doc.tree();

    let own = tree.leading_comments(id);
    if !own.is_empty() && !is_incomplete_function(doc, id) {
        trace!(?id, "comments attached to the node");
        return own.to_vec();
    }

    if let Some(name) = tree.identifier_child(id) {
        let named = tree.leading_comments(name);
        if !named.is_empty() {
            trace!(?id, "comments attached to the node's name");
            return named.to_vec();
        }
    }

    let mut current = id;
    for ancestor in ANCESTOR_CHAIN {
        let Some(parent) = tree.node(current).parent else {
            break;
        };
        if !ancestor.matches(&tree.node(parent).kind) {
            continue;
        }
        current = parent;
        let inherited = tree.leading_comments(current);
        if !inherited.is_empty() {
            trace!(?id, ancestor = ?current, "comments attached to an ancestor");
            return inherited.to_vec();
        }
    }

    let start = tree.node(current).range.start;
    match preceding_comment(tree.comments(), doc.text(), start) {
        Some(comment) => {
            trace!(?id, ?comment, "nearest preceding comment");
            vec![comment]
        }
        None => Vec::new(),
    }
}

/// A function expression whose body starts where the node starts has no parameter list of its
/// own, and whatever the parser attached to it belongs to something else.
fn is_incomplete_function(doc: &SourceDocument, id: NodeId) -> bool {
    let node = doc.tree().node(id);
    match &node.kind {
        NodeKind::FunctionExpression(function) => function.body.start == node.range.start,
        _ => false,
    }
}

/// Finds the last comment ending at or before `before`, provided only whitespace lies between
/// its end and `before`.
///
/// `comments` must be ordered by position. The search never looks past the first comment
/// before `before`: if that one is separated by code, there is no match.
pub fn preceding_comment(comments: &[Comment], text: &str, before: usize) -> Option<CommentId> {
    let index = comments
        .partition_point(|comment| comment.range.end <= before)
        .checked_sub(1)?;
    let gap = text.get(comments[index].range.end..before)?;
    gap.chars()
        .all(char::is_whitespace)
        .then_some(CommentId(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use crate::tree::{CommentKind, TextRange};

    fn comment_texts<'a>(doc: &'a SourceDocument, ids: &[CommentId]) -> Vec<&'a str> {
        ids.iter()
            .map(|id| doc.slice(doc.tree().comment(*id).range))
            .collect()
    }

    fn block(start: usize, end: usize) -> Comment {
        Comment {
            kind: CommentKind::Block,
            range: TextRange::new(start, end),
        }
    }

    #[test]
    fn preceding_comment_requires_whitespace_gap() {
        //          0         1         2
        //          0123456789012345678901234
        let text = "/*a*/ x; /*b*/\n\t  y;";
        let comments = [block(0, 5), block(9, 14)];

        assert_eq!(preceding_comment(&comments, text, 18), Some(CommentId(1)));
        assert_eq!(preceding_comment(&comments, text, 14), Some(CommentId(1)));
        assert_eq!(preceding_comment(&comments, text, 6), Some(CommentId(0)));
        assert_eq!(preceding_comment(&comments, text, 8), None);
        assert_eq!(preceding_comment(&comments, text, 3), None);
        assert_eq!(preceding_comment(&[], text, 18), None);
    }

    #[test]
    fn preceding_comment_stops_at_first_gap_violation() {
        let text = "/*a*/\n/*b*/ z\n y";
        let comments = [block(0, 5), block(6, 11)];
        assert_eq!(preceding_comment(&comments, text, 15), None);
    }

    #[test]
    fn own_comments() {
        let doc = parse_helper("/** @param {string} x */\nfunction foo(x) {}");
        let id = find_node(&doc, "function foo");
        assert_eq!(
            comment_texts(&doc, &resolve(&doc, id)),
            vec!["/** @param {string} x */"]
        );
    }

    #[test]
    fn name_comments() {
        let doc = parse_helper("x = function\n/** c */\nfoo(a) {};");
        let id = find_node(&doc, "function\n");
        assert_eq!(comment_texts(&doc, &resolve(&doc, id)), vec!["/** c */"]);
    }

    #[test]
    fn assignment_comments() {
        let doc = parse_helper("/** doc */\na.foo = function foo(x, y) {};");
        let id = find_node(&doc, "function foo");
        assert_eq!(comment_texts(&doc, &resolve(&doc, id)), vec!["/** doc */"]);
    }

    #[test]
    fn declaration_comments() {
        let doc = parse_helper("/* one */\n/* two */\nvar baz = function (a) {};");
        let function = find_node(&doc, "function (a)");
        assert_eq!(
            comment_texts(&doc, &resolve(&doc, function)),
            vec!["/* one */", "/* two */"]
        );

        let declarator = find_node(&doc, "baz =");
        assert_eq!(
            comment_texts(&doc, &resolve(&doc, declarator)),
            vec!["/* one */", "/* two */"]
        );
    }

    #[test]
    fn property_comments() {
        let doc = parse_helper("var o = {\n  /** doc */\n  run: function (x) {}\n};");
        let property = find_node(&doc, "run:");
        assert_eq!(comment_texts(&doc, &resolve(&doc, property)), vec!["/** doc */"]);
    }

    #[test]
    fn whitespace_fallback() {
        let doc = parse_helper("foo(/** doc */ function (x) {});");
        let id = find_node(&doc, "function (x)");
        assert_eq!(comment_texts(&doc, &resolve(&doc, id)), vec!["/** doc */"]);
    }

    #[test]
    fn unrelated_comment_is_not_attached() {
        let doc = parse_helper("/** doc */\nfoo(function (x) {});");
        let id = find_node(&doc, "function (x)");
        assert!(resolve(&doc, id).is_empty());
    }
}
