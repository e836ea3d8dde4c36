use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::attach;
use crate::compose::Compositor;
use crate::error::ConvertError;
use crate::extract::{self, Annotation, JsDocParam};
use crate::tree::{CommentId, CommentKind, FunctionParts, NodeId, NodeKind, TextRange};

static FLOW_IGNORE_BEGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\*\s*flow-ignore-begin\s*\*/").unwrap());

static FLOW_IGNORE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\*\s*flow-ignore-end\s*\*/").unwrap());

static TYPE_INCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*\s*::(.+?)\*/").unwrap());

static FLOW_INCLUDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*\s*flow-include(.+?)\*/").unwrap());

/// Rewrites one node, reading and committing text through the compositor.
pub(crate) fn rewrite_node(cx: &mut Compositor<'_>, id: NodeId) -> Result<(), ConvertError> {
    let node = cx.document().tree().node(id);
    match &node.kind {
        NodeKind::Comment(comment) => rewrite_comment(cx, id, *comment),
        NodeKind::VariableDeclarator { id: name } => rewrite_declarator(cx, id, *name),
        kind => match kind.function() {
            Some(function) => rewrite_function(cx, id, function),
            None => Ok(()),
        },
    }
}

/// Turns the comment-only type syntax of a block comment into code.
///
/// A `/** @typedef {T} Name */` gains a `type Name = T; ` alias in front of it, a
/// `flow-ignore-begin`/`flow-ignore-end` pair becomes a plain comment around the region, and
/// `/* :: ... */` and `/* flow-include ... */` are unwrapped into their contents.
pub fn block_to_code(comment: &str) -> String {
    let mut text = comment.to_string();
    if let Annotation::Typedef(typedef) = extract::extract(&text) {
        text.insert_str(0, &typedef.to_alias());
    }

    let text = FLOW_IGNORE_BEGIN.replace(&text, "/*");
    let text = FLOW_IGNORE_END.replace(&text, "*/");
    let text = TYPE_INCLUDE.replace(&text, "${1}");
    let text = FLOW_INCLUDE.replace(&text, "${1}");
    text.into_owned()
}

fn rewrite_comment(
    cx: &mut Compositor<'_>,
    id: NodeId,
    comment: CommentId,
) -> Result<(), ConvertError> {
    let comment = *cx.document().tree().comment(comment);
    if comment.kind != CommentKind::Block {
        return Ok(());
    }
    let text = cx.node_text(id);
    cx.commit(comment.range, block_to_code(&text))
}

fn rewrite_declarator(
    cx: &mut Compositor<'_>,
    id: NodeId,
    name: TextRange,
) -> Result<(), ConvertError> {
    let doc = cx.document();
    let range = doc.tree().node(id).range;

    let mut type_expr = None;
    for comment in attach::resolve(doc, id) {
        let text = cx.text(doc.tree().comment(comment).range);
        if let Annotation::VariableType { type_expr: found } = extract::extract(&text) {
            type_expr = Some(found);
        }
    }
    let Some(type_expr) = type_expr else {
        return Ok(());
    };

    trace!(%range, %type_expr, "annotating variable");
    let text = format!(
        "{}{}: {}{}",
        cx.text(TextRange::new(range.start, name.start)),
        cx.text(name),
        type_expr,
        cx.text(TextRange::new(name.end, range.end)),
    );
    cx.commit(range, text)
}

/// A function's header split at the end of its name, so the parameter list is searched for
/// only after it.
struct Header {
    name: String,
    signature: String,
}

impl Header {
    fn read(cx: &Compositor<'_>, range: TextRange, function: &FunctionParts) -> Self {
        let split = function
            .signature_start
            .clamp(range.start, function.body.start);
        Self {
            name: cx.text(TextRange::new(range.start, split)),
            signature: cx.text(TextRange::new(split, function.body.start)),
        }
    }

    /// Replaces everything from the opening parenthesis of the parameter list on.
    fn with_signature(&self, replacement: &str) -> Option<String> {
        let open = self.signature.find('(')?;
        Some(format!(
            "{}{}{}",
            self.name,
            &self.signature[..open],
            replacement
        ))
    }

    /// The whitespace between the end of the signature and the body.
    fn trailing_whitespace(&self) -> &str {
        &self.signature[self.signature.trim_end().len()..]
    }

    fn text(&self) -> String {
        format!("{}{}", self.name, self.signature)
    }
}

fn rewrite_function(
    cx: &mut Compositor<'_>,
    id: NodeId,
    function: &FunctionParts,
) -> Result<(), ConvertError> {
    let doc = cx.document();
    let node = doc.tree().node(id);
    let range = node.range;
    let body = TextRange::new(function.body.start, range.end);

    let mut params: Option<Vec<JsDocParam>> = None;
    let mut returns: Option<String> = None;
    for comment in attach::resolve(doc, id) {
        let comment_range = doc.tree().comment(comment).range;
        match extract::extract(&cx.text(comment_range)) {
            Annotation::InlineColon { signature } => {
                trace!(%range, %signature, "inline signature");
                cx.commit(comment_range, String::new())?;
                let header = Header::read(cx, range, function);
                if let Some(header) = header.with_signature(&signature) {
                    let text = header + &cx.text(body);
                    cx.commit(range, text)?;
                }
                return Ok(());
            }
            Annotation::ParamReturn {
                params: found,
                returns: returned,
            } => {
                if !found.is_empty() {
                    params = Some(found);
                }
                if returned.is_some() {
                    returns = returned;
                }
            }
            // Typedefs are hoisted by the comment itself; variable types belong to declarators.
            Annotation::Typedef(_)
            | Annotation::VariableType { .. }
            | Annotation::Members(_)
            | Annotation::None => {}
        }
    }

    let members = match node.kind {
        NodeKind::MethodDefinition {
            constructor: true, ..
        } => match extract::constructor(&cx.node_text(id)) {
            Annotation::Members(found) => found,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    if params.is_some() || returns.is_some() || !members.is_empty() {
        let header = Header::read(cx, range, function);
        let documented = params.unwrap_or_default();
        let list: Vec<String> = function
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let original = cx.text(*param);
                match documented.get(i) {
                    Some(JsDocParam {
                        name: Some(name),
                        type_expr,
                    }) => format!("{}: {}", name, type_expr),
                    Some(JsDocParam {
                        name: None,
                        type_expr,
                    }) => format!("{}: {}", original, type_expr),
                    None => original,
                }
            })
            .collect();

        let mut signature = format!("({})", list.join(", "));
        if let Some(returns) = &returns {
            signature.push_str(": ");
            signature.push_str(returns);
        }
        signature.push_str(header.trailing_whitespace());

        let Some(header) = header.with_signature(&signature) else {
            return Ok(());
        };
        trace!(%range, params = list.len(), members = members.len(), "rebuilding signature");
        let fields: String = members.iter().map(|member| member.to_field()).collect();
        let text = format!("{}{}{}", fields, header, cx.text(body));
        return cx.commit(range, text);
    }

    if node.kind.is_method() {
        let mut markers: Vec<CommentId> = doc.tree().comments_before(function.body.start).to_vec();
        if function.value_start != range.start {
            markers.extend_from_slice(doc.tree().comments_before(function.value_start));
        }
        for comment in markers {
            let comment_range = doc.tree().comment(comment).range;
            let text = cx.text(comment_range);
            let replaced = extract::substitute_colon_markers(&text).into_owned();
            cx.commit(comment_range, replaced)?;
        }
    }

    let header = Header::read(cx, range, function).text();
    let text = extract::substitute_colon_markers(&header).into_owned() + &cx.text(body);
    cx.commit(range, text)
}
