/// The syntax accepted by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Plain JavaScript. Inline type annotations are parse errors.
    #[default]
    JavaScript,

    /// TypeScript syntax, so already converted files can be fed through again.
    TypeScript,
}

/// Settings for one conversion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Parse JSX syntax, as found in `.jsx` files.
    pub jsx: bool,

    /// Emit a `debug` event for every committed edit.
    pub verbose: bool,

    /// The syntax of the input.
    pub dialect: Dialect,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            jsx: true,
            verbose: false,
            dialect: Dialect::default(),
        }
    }
}
