//! SassScript runtime values.
//!
//! The binding value for the `variable` namespace. Arithmetic and
//! coercions live with the expression evaluator; this module only defines
//! the representation, truthiness, and a `Display` for inspection output.

use std::fmt;

/// Separator of a SassScript list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListSeparator {
    /// `a b c`
    Space,
    /// `a, b, c`
    Comma,
}

impl ListSeparator {
    fn as_str(self) -> &'static str {
        match self {
            ListSeparator::Space => " ",
            ListSeparator::Comma => ", ",
        }
    }
}

/// A SassScript value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The null value; falsey and emitted as nothing.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// A number with an optional unit (`12`, `1.5em`, `50%`).
    Number {
        num: f64,
        unit: Option<Box<str>>,
    },
    /// A string, quoted or an unquoted identifier.
    Str {
        text: Box<str>,
        quoted: bool,
    },
    /// An RGBA color.
    Color {
        red: u8,
        green: u8,
        blue: u8,
        alpha: f64,
    },
    /// A space- or comma-separated list.
    List {
        elements: Vec<Value>,
        separator: ListSeparator,
    },
}

impl Value {
    /// A unitless number.
    pub fn number(num: f64) -> Value {
        Value::Number { num, unit: None }
    }

    /// A number with a unit.
    pub fn with_unit(num: f64, unit: impl Into<Box<str>>) -> Value {
        Value::Number {
            num,
            unit: Some(unit.into()),
        }
    }

    /// A pixel length.
    pub fn px(num: f64) -> Value {
        Value::with_unit(num, "px")
    }

    /// A quoted string.
    pub fn string(text: impl Into<Box<str>>) -> Value {
        Value::Str {
            text: text.into(),
            quoted: true,
        }
    }

    /// An unquoted identifier.
    pub fn ident(text: impl Into<Box<str>>) -> Value {
        Value::Str {
            text: text.into(),
            quoted: false,
        }
    }

    /// A boolean.
    pub fn boolean(value: bool) -> Value {
        Value::Bool(value)
    }

    /// An opaque RGB color.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Value {
        Value::Color {
            red,
            green,
            blue,
            alpha: 1.0,
        }
    }

    /// Everything is truthy except `null` and `false`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number { num, unit } => {
                write!(f, "{num}")?;
                if let Some(unit) = unit {
                    f.write_str(unit)?;
                }
                Ok(())
            }
            Value::Str { text, quoted } => {
                if *quoted {
                    write!(f, "\"{text}\"")
                } else {
                    f.write_str(text)
                }
            }
            Value::Color {
                red,
                green,
                blue,
                alpha,
            } => {
                if (alpha - 1.0).abs() < f64::EPSILON {
                    write!(f, "#{red:02x}{green:02x}{blue:02x}")
                } else {
                    write!(f, "rgba({red}, {green}, {blue}, {alpha})")
                }
            }
            Value::List {
                elements,
                separator,
            } => {
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(separator.as_str())?;
                    }
                    write!(f, "{element}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn truthiness() {
        assert!(Value::number(0.0).is_truthy());
        assert!(Value::string("").is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::boolean(false).is_truthy());
    }

    #[test]
    fn display_numbers_and_units() {
        assert_eq!(Value::number(3.0).to_string(), "3");
        assert_eq!(Value::px(12.0).to_string(), "12px");
        assert_eq!(Value::with_unit(50.0, "%").to_string(), "50%");
    }

    #[test]
    fn display_colors() {
        assert_eq!(Value::rgb(255, 0, 51).to_string(), "#ff0033");
        let translucent = Value::Color {
            red: 0,
            green: 0,
            blue: 0,
            alpha: 0.5,
        };
        assert_eq!(translucent.to_string(), "rgba(0, 0, 0, 0.5)");
    }

    #[test]
    fn display_lists() {
        let list = Value::List {
            elements: vec![Value::px(1.0), Value::ident("solid"), Value::rgb(0, 0, 0)],
            separator: ListSeparator::Space,
        };
        assert_eq!(list.to_string(), "1px solid #000000");
    }
}
