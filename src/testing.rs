use crate::config::Options;
use crate::parse::parse;
use crate::tree::{FunctionParts, NodeId, SourceDocument};

pub(crate) fn parse_helper(contents: &str) -> SourceDocument {
    parse(contents, &Options::default()).expect("error parsing")
}

pub(crate) fn convert_helper(contents: &str) -> String {
    crate::convert(contents).expect("error converting")
}

/// Every node id of the document, in creation order.
pub(crate) fn nodes(doc: &SourceDocument) -> impl Iterator<Item = NodeId> + '_ {
    (0..doc.tree().len()).map(NodeId)
}

/// Finds the first function-like node whose source text starts with `prefix`.
pub(crate) fn find_function(doc: &SourceDocument, prefix: &str) -> (NodeId, FunctionParts) {
    nodes(doc)
        .find_map(|id| {
            let node = doc.tree().node(id);
            let function = node.kind.function()?;
            doc.slice(node.range)
                .starts_with(prefix)
                .then(|| (id, function.clone()))
        })
        .unwrap_or_else(|| panic!("no function starting with {:?}", prefix))
}

/// Finds the first node below the root whose source text starts with `prefix`.
pub(crate) fn find_node(doc: &SourceDocument, prefix: &str) -> NodeId {
    nodes(doc)
        .skip(1)
        .find(|id| doc.slice(doc.tree().node(*id).range).starts_with(prefix))
        .unwrap_or_else(|| panic!("no node starting with {:?}", prefix))
}
