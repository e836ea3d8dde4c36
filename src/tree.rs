use std::fmt::Display;

use rustc_hash::FxHashMap;

use crate::error::ConvertError;

/// A half-open byte range `[start, end)` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextRange {
    /// The offset of the first byte.
    pub start: usize,

    /// The offset one past the last byte.
    pub end: usize,
}

impl TextRange {
    /// Creates a new [`TextRange`].
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The length of the range in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `other` lies entirely within this range.
    pub fn contains(&self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl Display for TextRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Index of a node in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Index of a comment in a [`SyntaxTree`]'s position-ordered comment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommentId(pub(crate) usize);

/// The pieces of a function-like node the rewriter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParts {
    /// The range of the function body, braces included.
    pub body: TextRange,

    /// The range of each declared parameter, in order.
    pub params: Vec<TextRange>,

    /// Where to start looking for the opening parenthesis of the parameter list. This is the end
    /// of the function's name or property key, so parentheses inside a computed key are skipped.
    pub signature_start: usize,

    /// Where the function value itself starts. For methods this may differ from the node start.
    pub value_start: usize,
}

/// The kinds of node the converter distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The whole document.
    Program,

    /// `function name(...) {...}` as a statement.
    FunctionDeclaration(FunctionParts),

    /// `function (...) {...}` as an expression.
    FunctionExpression(FunctionParts),

    /// A class method, accessor or constructor.
    MethodDefinition {
        /// The method's signature and body.
        function: FunctionParts,

        /// Whether this is the class constructor.
        constructor: bool,
    },

    /// A property of an object literal.
    Property {
        /// Set when the property's value is a function (`key: function () {}`, `key() {}`, or
        /// an accessor), in which case the property is rewritten like a function.
        function: Option<FunctionParts>,

        /// Whether the property uses method shorthand or accessor syntax.
        method: bool,
    },

    /// One `name = init` binding of a variable declaration.
    VariableDeclarator {
        /// The range of the bound name or pattern.
        id: TextRange,
    },

    /// `var`, `let` or `const` with all of its declarators.
    VariableDeclaration,

    /// `target = value` and its compound forms.
    AssignmentExpression,

    /// The name of a function or a declared variable.
    Identifier,

    /// A comment, as a leaf of the innermost node containing it.
    Comment(CommentId),

    /// Any other statement or expression.
    Other,
}

impl NodeKind {
    /// The function parts of a node rewritten as a function, if any.
    pub fn function(&self) -> Option<&FunctionParts> {
        match self {
            NodeKind::FunctionDeclaration(function)
            | NodeKind::FunctionExpression(function)
            | NodeKind::MethodDefinition { function, .. }
            | NodeKind::Property {
                function: Some(function),
                ..
            } => Some(function),
            _ => None,
        }
    }

    /// Whether the node is written in ES6 method style (class members and object shorthand).
    pub fn is_method(&self) -> bool {
        matches!(
            self,
            NodeKind::MethodDefinition { .. } | NodeKind::Property { method: true, .. }
        )
    }
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    /// What the node is.
    pub kind: NodeKind,

    /// Where the node is in the source.
    pub range: TextRange,

    /// The enclosing node. Only the root has none.
    pub parent: Option<NodeId>,

    /// Child nodes in source order.
    pub children: Vec<NodeId>,
}

/// The two comment forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `/* ... */`, including `/** ... */` doc blocks.
    Block,

    /// `// ...`
    Line,
}

/// A comment in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment {
    /// Which form of comment this is.
    pub kind: CommentKind,

    /// Where the comment is in the source, delimiters included.
    pub range: TextRange,
}

/// An arena syntax tree with comments, produced by [`crate::parse`].
///
/// Nodes refer to their parent and children by [`NodeId`]; the tree is the only owner.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    comments: Vec<Comment>,
    leading: FxHashMap<usize, Vec<CommentId>>,
}

impl SyntaxTree {
    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Looks up a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// The number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a comment.
    pub fn comment(&self, id: CommentId) -> &Comment {
        &self.comments[id.0]
    }

    /// Every comment in the document, ordered by position.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// The comments the parser attached to whatever starts at `offset`.
    pub fn comments_before(&self, offset: usize) -> &[CommentId] {
        self.leading.get(&offset).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The comments the parser attached in front of a node.
    pub fn leading_comments(&self, id: NodeId) -> &[CommentId] {
        let node = self.node(id);
        match node.kind {
            NodeKind::Program | NodeKind::Comment(_) => &[],
            _ => self.comments_before(node.range.start),
        }
    }

    /// The first [`NodeKind::Identifier`] child of a node.
    pub fn identifier_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .find(|child| self.node(*child).kind == NodeKind::Identifier)
    }

    /// Checks that every range lies within a document of length `len`, falls on character
    /// boundaries of `text`, and that children are nested inside their parents.
    pub fn validate(&self, text: &str) -> Result<(), ConvertError> {
        let check = |range: TextRange| {
            if range.start > range.end || range.end > text.len() {
                Err(ConvertError::RangeOutOfBounds {
                    range,
                    len: text.len(),
                })
            } else if !text.is_char_boundary(range.start) || !text.is_char_boundary(range.end) {
                Err(ConvertError::NotCharBoundary { range })
            } else {
                Ok(())
            }
        };

        for node in &self.nodes {
            check(node.range)?;
            if let Some(parent) = node.parent {
                let parent = self.node(parent).range;
                if !parent.contains(node.range) {
                    return Err(ConvertError::RangeNotNested {
                        child: node.range,
                        parent,
                    });
                }
            }
        }

        for comment in &self.comments {
            check(comment.range)?;
        }

        Ok(())
    }
}

/// Incrementally assembles a [`SyntaxTree`] in source order.
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    /// Creates a builder whose root covers `len` bytes.
    pub fn new(len: usize) -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Program,
                range: TextRange::new(0, len),
                parent: None,
                children: Vec::new(),
            }],
            stack: vec![NodeId(0)],
        }
    }

    /// Adds a node as the last child of the current node and makes it current.
    pub fn enter(&mut self, kind: NodeKind, range: TextRange) -> NodeId {
        let id = self.push(kind, range);
        self.stack.push(id);
        id
    }

    /// Returns to the parent of the current node.
    pub fn exit(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Adds a node with no children.
    pub fn leaf(&mut self, kind: NodeKind, range: TextRange) -> NodeId {
        self.push(kind, range)
    }

    fn push(&mut self, kind: NodeKind, range: TextRange) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = self.stack.last().copied();
        self.nodes.push(Node {
            kind,
            range,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    /// Finishes the tree.
    ///
    /// `comments` may come in any order and contain duplicates; `leading` maps the offset of a
    /// token to the comments directly in front of it. Every comment also becomes a
    /// [`NodeKind::Comment`] leaf of the innermost node that contains it.
    pub fn finish(
        mut self,
        mut comments: Vec<Comment>,
        leading: Vec<(usize, Vec<TextRange>)>,
    ) -> SyntaxTree {
        comments.sort_by_key(|comment| (comment.range.start, comment.range.end));
        comments.dedup_by_key(|comment| comment.range);

        let id_of = |range: TextRange| {
            comments
                .binary_search_by_key(&(range.start, range.end), |comment| {
                    (comment.range.start, comment.range.end)
                })
                .ok()
                .map(CommentId)
        };

        let mut attached = FxHashMap::default();
        for (offset, ranges) in leading {
            let mut ids: Vec<CommentId> = ranges.into_iter().filter_map(id_of).collect();
            ids.sort();
            ids.dedup();
            if !ids.is_empty() {
                attached.insert(offset, ids);
            }
        }

        let mut touched = Vec::new();
        for (index, comment) in comments.iter().enumerate() {
            let parent = self.innermost(comment.range);
            let id = NodeId(self.nodes.len());
            self.nodes.push(Node {
                kind: NodeKind::Comment(CommentId(index)),
                range: comment.range,
                parent: Some(parent),
                children: Vec::new(),
            });
            self.nodes[parent.0].children.push(id);
            touched.push(parent);
        }

        touched.sort();
        touched.dedup();
        for parent in touched {
            let mut children = std::mem::take(&mut self.nodes[parent.0].children);
            children.sort_by_key(|child| self.nodes[child.0].range.start);
            self.nodes[parent.0].children = children;
        }

        SyntaxTree {
            nodes: self.nodes,
            comments,
            leading: attached,
        }
    }

    fn innermost(&self, range: TextRange) -> NodeId {
        let mut current = NodeId(0);
        'descend: loop {
            for child in &self.nodes[current.0].children {
                let node = &self.nodes[child.0];
                if !matches!(node.kind, NodeKind::Comment(_)) && node.range.contains(range) {
                    current = *child;
                    continue 'descend;
                }
            }
            return current;
        }
    }
}

/// Immutable source text together with its syntax tree.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    text: String,
    tree: SyntaxTree,
}

impl SourceDocument {
    /// Pairs a text with its tree after checking that the tree's ranges fit the text.
    pub fn new(text: String, tree: SyntaxTree) -> Result<Self, ConvertError> {
        tree.validate(&text)?;
        Ok(Self { text, tree })
    }

    /// The original text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The syntax tree.
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// The original text of a range.
    pub fn slice(&self, range: TextRange) -> &str {
        &self.text[range.start..range.end]
    }
}
