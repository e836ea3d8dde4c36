#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// Finds the comments that document a node: its own, its name's, an enclosing assignment's,
/// declarator's, declaration's or property's, and finally the nearest preceding comment.
pub mod attach;

/// Implements the bottom-up traversal that rewrites nodes innermost first, and the [`compose::EditMap`]
/// that lets a parent read its children's rewritten text.
pub mod compose;

/// Conversion settings.
pub mod config;

/// The error type returned by every fallible operation.
pub mod error;

/// Reads type information out of comment text: JSDoc tags, inline `/*: ... */` signatures and
/// markers, and constructor member declarations.
pub mod extract;

/// Implements utility functions for transforming the ast produced by [`swc_ecma_parser`] into the
/// arena [`tree::SyntaxTree`] used for comment attachment. Only nodes that can carry or receive an
/// annotation are recorded.
pub mod parse;

/// Rewrites a single node's text according to the annotations attached to it.
pub mod rewrite;

/// Private crate for testing utilities.
#[cfg(test)]
pub(crate) mod testing;

/// The arena syntax tree, its comments, and the immutable source document.
pub mod tree;

pub use config::{Dialect, Options};
pub use error::ConvertError;

use compose::Compositor;
use tracing::debug;

/// Converts comment-based type annotations in `text` into inline annotations, using the default
/// [`Options`].
///
/// # Example
/// ```
/// let out = flotate::convert("/** @param {string} x */\nfunction f(x) {}").unwrap();
/// assert_eq!(out, "/** @param {string} x */\nfunction f(x: string) {}");
/// ```
pub fn convert(text: &str) -> Result<String, ConvertError> {
    convert_with(text, &Options::default())
}

/// Converts comment-based type annotations in `text` into inline annotations.
///
/// Comments are never removed except for inline `/*: (...) */` signatures, which move into the
/// signature they describe. Nodes without annotations keep their text byte for byte.
pub fn convert_with(text: &str, options: &Options) -> Result<String, ConvertError> {
    let doc = parse::parse(text, options)?;
    debug!(
        nodes = doc.tree().len(),
        comments = doc.tree().comments().len(),
        "parsed document"
    );
    Compositor::new(&doc, *options).run()
}
