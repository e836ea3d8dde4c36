use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// `/*: (x: T, y: U): R */`, capturing everything from the opening parenthesis.
static INLINE_SIGNATURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^/\*\s*:\s*(\(.*?)\*/").unwrap());

/// `/*: T */` anywhere in a text.
static COLON_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*\s*:(.+?)\*/").unwrap());

static TYPEDEF_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^/\*\*[\s*]*@typedef\s*\{").unwrap());

static TYPEDEF_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z0-9]+)[\s*]*\*/").unwrap());

static PARAM_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"@param\s*\{").unwrap());

static PARAM_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*([^\s-]*)").unwrap());

static RETURN_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"@returns?\s*\{").unwrap());

static MEMBER_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\*\*[\s*]*@(?:type|private|protected|public)\s*\{").unwrap());

static MEMBER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s*]*\*/\s*this\.([A-Za-z0-9]+)").unwrap());

static VARIABLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(?:type|constant|const)\s*\{").unwrap());

/// A `@typedef {Type} Name` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typedef {
    /// The declared type name.
    pub name: String,

    /// The type expression, verbatim.
    pub type_expr: String,
}

impl Typedef {
    /// Renders the declaration as an inline type alias.
    pub fn to_alias(&self) -> String {
        format!("type {} = {}; ", self.name, self.type_expr)
    }
}

/// One `@param {Type} name` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsDocParam {
    /// The documented parameter name. Missing when the tag only gives a type.
    pub name: Option<String>,

    /// The type expression, verbatim.
    pub type_expr: String,
}

/// A `/** @type {Type} */ this.name` member declaration inside a constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// The member name.
    pub name: String,

    /// The type expression, verbatim.
    pub type_expr: String,
}

impl Member {
    /// Renders the member as a class field declaration.
    pub fn to_field(&self) -> String {
        format!("{}: {}; ", self.name, self.type_expr)
    }
}

/// Type information extracted from a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// `/** @typedef {Type} Name */`
    Typedef(Typedef),

    /// `@param` and `@return` tags of a doc block.
    ParamReturn {
        /// The parameter tags in order.
        params: Vec<JsDocParam>,

        /// The `@return` type, if any.
        returns: Option<String>,
    },

    /// Member declarations found in a constructor's text. Produced by [`constructor`], never by
    /// [`extract`].
    Members(Vec<Member>),

    /// A `/*: (...): R */` comment replacing a whole signature.
    InlineColon {
        /// The replacement for everything from the parameter list's opening parenthesis on.
        signature: String,
    },

    /// `@type`, `@const` or `@constant` on a variable.
    VariableType {
        /// The type expression, verbatim.
        type_expr: String,
    },

    /// Nothing recognised.
    None,
}

/// Extracts the highest-precedence annotation from a comment's full text, delimiters included.
///
/// Inline colon signatures win over everything. Typedefs, parameters and return types are only
/// read from comments that start with `/**`, in that order. A variable type is read from any
/// comment.
pub fn extract(comment: &str) -> Annotation {
    if let Some(signature) = inline_signature(comment) {
        return Annotation::InlineColon {
            signature: signature.to_string(),
        };
    }

    if comment.starts_with("/**") {
        if let Some(typedef) = typedef(comment) {
            return Annotation::Typedef(typedef);
        }

        let params = params(comment);
        let returns = return_type(comment);
        if !params.is_empty() || returns.is_some() {
            return Annotation::ParamReturn { params, returns };
        }
    }

    match variable_type(comment) {
        Some(type_expr) => Annotation::VariableType { type_expr },
        None => Annotation::None,
    }
}

/// The replacement signature of a `/*: (...) */` comment.
pub fn inline_signature(comment: &str) -> Option<&str> {
    INLINE_SIGNATURE
        .captures(comment)
        .and_then(|captures| captures.get(1))
        .map(|signature| signature.as_str())
}

/// Finds a `/** @typedef {Type} Name */` comment at the start of a line.
pub fn typedef(text: &str) -> Option<Typedef> {
    TYPEDEF_TAG.find_iter(text).find_map(|tag| {
        let (type_expr, rest) = braced(text, tag.end())?;
        let name = TYPEDEF_NAME.captures(&text[rest..])?.get(1)?.as_str();
        Some(Typedef {
            name: name.to_string(),
            type_expr: type_expr.to_string(),
        })
    })
}

/// Every `@param` tag in order.
pub fn params(comment: &str) -> Vec<JsDocParam> {
    PARAM_TAG
        .find_iter(comment)
        .filter_map(|tag| {
            let (type_expr, rest) = braced(comment, tag.end())?;
            let name = PARAM_NAME
                .captures(&comment[rest..])
                .and_then(|captures| captures.get(1))
                .map(|name| name.as_str().trim_end_matches("*/"))
                .filter(|name| !name.is_empty() && !name.starts_with("*/"));
            Some(JsDocParam {
                name: name.map(str::to_string),
                type_expr: type_expr.to_string(),
            })
        })
        .collect()
}

/// The type of the first `@return` or `@returns` tag.
pub fn return_type(comment: &str) -> Option<String> {
    RETURN_TAG
        .find_iter(comment)
        .find_map(|tag| braced(comment, tag.end()))
        .map(|(type_expr, _)| type_expr.to_string())
}

/// The type of the first `@type`, `@const` or `@constant` tag.
pub fn variable_type(comment: &str) -> Option<String> {
    VARIABLE_TAG
        .find_iter(comment)
        .find_map(|tag| braced(comment, tag.end()))
        .map(|(type_expr, _)| type_expr.to_string())
}

/// Every `/** @type {T} */ this.name` declaration in a constructor's text, in order.
pub fn members(constructor: &str) -> Vec<Member> {
    MEMBER_TAG
        .find_iter(constructor)
        .filter_map(|tag| {
            let (type_expr, rest) = braced(constructor, tag.end())?;
            let name = MEMBER_NAME.captures(&constructor[rest..])?.get(1)?.as_str();
            Some(Member {
                name: name.to_string(),
                type_expr: type_expr.to_string(),
            })
        })
        .collect()
}

/// Scans a constructor's full text for member declarations.
pub fn constructor(text: &str) -> Annotation {
    let found = members(text);
    if found.is_empty() {
        Annotation::None
    } else {
        Annotation::Members(found)
    }
}

/// Replaces every `/*: T */` marker with `: T`.
pub fn substitute_colon_markers(text: &str) -> Cow<'_, str> {
    COLON_MARKER.replace_all(text, |captures: &regex::Captures| {
        format!(": {}", captures[1].trim())
    })
}

/// Reads a type expression whose opening brace ends just before `start`, up to the matching
/// closing brace. Returns the expression and the offset just past the closing brace.
fn braced(text: &str, start: usize) -> Option<(&str, usize)> {
    let mut depth = 1usize;
    for (i, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&text[start..start + i], start + i + 1));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, type_expr: &str) -> JsDocParam {
        JsDocParam {
            name: Some(name.to_string()),
            type_expr: type_expr.to_string(),
        }
    }

    #[test]
    fn inline_colon() {
        assert_eq!(
            extract("/*: (x: string, y: number): boolean */"),
            Annotation::InlineColon {
                signature: "(x: string, y: number): boolean ".to_string()
            }
        );
        assert_eq!(inline_signature("/* : (x: T) */"), Some("(x: T) "));
        assert_eq!(inline_signature("/*: number */"), None);
        assert_eq!(inline_signature("/** @param {T} x */"), None);
    }

    #[test]
    fn inline_colon_beats_doc_tags() {
        assert!(matches!(
            extract("/*: (x: A): B @param {C} x */"),
            Annotation::InlineColon { .. }
        ));
    }

    #[test]
    fn param_return_multiline() {
        let comment = "/**\n * @param {string} x\n * @param {number} y\n * @return {boolean}\n */";
        assert_eq!(
            extract(comment),
            Annotation::ParamReturn {
                params: vec![param("x", "string"), param("y", "number")],
                returns: Some("boolean".to_string()),
            }
        );
    }

    #[test]
    fn param_return_single_line() {
        let comment = "/** @param {string} x @param {number} y @return {boolean} */";
        assert_eq!(params(comment), vec![param("x", "string"), param("y", "number")]);
        assert_eq!(return_type(comment), Some("boolean".to_string()));
    }

    #[test]
    fn nested_braces_and_unnamed_params() {
        let comment = "/** @param {{id: number}} foo - the foo\n * @param {Array<{a: b}>}\n */";
        assert_eq!(
            params(comment),
            vec![
                param("foo", "{id: number}"),
                JsDocParam {
                    name: None,
                    type_expr: "Array<{a: b}>".to_string()
                },
            ]
        );
        assert_eq!(return_type("/** @returns {?string} */"), Some("?string".to_string()));
    }

    #[test]
    fn only_doc_blocks_carry_function_tags() {
        assert_eq!(extract("/* @param {string} x */"), Annotation::None);
        assert_eq!(extract("/* @typedef {number} Id */"), Annotation::None);
        assert_eq!(extract("/** just words */"), Annotation::None);
        assert_eq!(
            extract("// @type {number}"),
            Annotation::VariableType {
                type_expr: "number".to_string()
            }
        );
    }

    #[test]
    fn typedef_tag() {
        let text = "/** @typedef {{id: number}} FooBar */";
        assert_eq!(
            typedef(text),
            Some(Typedef {
                name: "FooBar".to_string(),
                type_expr: "{id: number}".to_string()
            })
        );
        assert_eq!(
            typedef(text).unwrap().to_alias(),
            "type FooBar = {id: number}; "
        );
        assert!(matches!(extract(text), Annotation::Typedef(_)));
        assert_eq!(typedef("/** @typedef {number} */"), None);
    }

    #[test]
    fn variable_tags() {
        assert_eq!(
            extract("/** @type {number} */"),
            Annotation::VariableType {
                type_expr: "number".to_string()
            }
        );
        assert_eq!(variable_type("/** @const {Foo} */"), Some("Foo".to_string()));
        assert_eq!(variable_type("/** @constant {Bar} */"), Some("Bar".to_string()));
        assert_eq!(variable_type("/** @typedef {X} Y */"), None);
    }

    #[test]
    fn constructor_members() {
        let body = "constructor(key) {\n  /** @type {{[key:string]: number}} */\n  this.map = {};\n  /** @private {number} */ this.count = 0;\n  /** @type {string} */ var local = '';\n}";
        assert_eq!(
            members(body),
            vec![
                Member {
                    name: "map".to_string(),
                    type_expr: "{[key:string]: number}".to_string()
                },
                Member {
                    name: "count".to_string(),
                    type_expr: "number".to_string()
                },
            ]
        );
        assert_eq!(members(body)[1].to_field(), "count: number; ");
        assert!(matches!(constructor(body), Annotation::Members(found) if found.len() == 2));
        assert_eq!(constructor("constructor() { this.a = 1; }"), Annotation::None);
    }

    #[test]
    fn colon_markers() {
        assert_eq!(
            substitute_colon_markers("function f(x /*: number */, y /* : string*/) /*: void */ "),
            "function f(x : number, y : string) : void "
        );
        assert!(matches!(
            substitute_colon_markers("function f(x) "),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn param_name_touching_the_comment_end() {
        assert_eq!(params("/** @param {string} x*/"), vec![param("x", "string")]);
        assert_eq!(
            params("/** @param {string} */"),
            vec![JsDocParam {
                name: None,
                type_expr: "string".to_string()
            }]
        );
    }

    #[test]
    fn unbalanced_braces_are_ignored() {
        assert_eq!(params("/** @param {string x */"), vec![]);
        assert_eq!(return_type("/** @return {a{b} */"), None);
    }
}
