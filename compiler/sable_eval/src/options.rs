//! Compile-pass configuration.
//!
//! Built once by the driver, shared as `Rc<Options>`, and inherited by
//! reference through the environment graph. The scoping core threads the
//! bag around without interpreting it.

/// CSS output style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputStyle {
    /// Indented to mirror the nesting of the source document.
    #[default]
    Nested,
    /// One property per line, rules fully expanded.
    Expanded,
    /// Each rule on a single line.
    Compact,
    /// Whitespace stripped.
    Compressed,
}

/// Immutable configuration for one compile pass.
///
/// Never mutated after construction. Environments created without an
/// explicit options bag inherit their creator's by reference.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Options {
    /// Output style for the emitter.
    pub style: OutputStyle,
    /// Decimal places kept when emitting numbers.
    pub precision: usize,
    /// Emit comments noting the source line of each selector.
    pub line_comments: bool,
    /// Silence `@warn` output.
    pub quiet: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            style: OutputStyle::Nested,
            precision: 5,
            line_comments: false,
            quiet: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_precision_is_five() {
        let options = Options::default();
        assert_eq!(options.precision, 5);
        assert_eq!(options.style, OutputStyle::Nested);
    }
}
