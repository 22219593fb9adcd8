//! Declarative argument specifications.
//!
//! An [`ArgumentSpec`] states how many tokens a command accepts and how each
//! positional token is converted. Parsing is pure: it never touches server
//! state, so a rejected command has no side effects.

use std::fmt;

use thiserror::Error;

/// How a positional argument is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Kept verbatim.
    Word,
    /// Converted to ASCII upper case.
    Upper,
    /// Signed decimal integer.
    Int,
    /// `0`, `1`, `true` or `false` (case-insensitive).
    Bool,
    /// Absorbs this and every following token, joined with single spaces.
    Sentence,
}

/// A converted argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// Word, upper-cased word or sentence.
    Text(String),
    /// Integer argument.
    Int(i64),
    /// Boolean argument.
    Bool(bool),
}

/// Argument parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    /// Token count outside the accepted range.
    #[error("expected {range} arguments, got {got}")]
    Arity {
        /// Accepted range, rendered for diagnostics.
        range: Arity,
        /// Number of tokens supplied.
        got: usize,
    },
    /// A token declared as integer did not parse.
    #[error("argument {position} is not an integer: {token:?}")]
    NotAnInteger {
        /// Zero-based argument position.
        position: usize,
        /// The offending token.
        token: String,
    },
    /// A token declared as boolean did not parse.
    #[error("argument {position} is not a boolean: {token:?}")]
    NotABoolean {
        /// Zero-based argument position.
        position: usize,
        /// The offending token.
        token: String,
    },
    /// An accessor asked for an argument that was not supplied.
    #[error("argument {0} is missing")]
    Missing(usize),
    /// An accessor asked for the wrong value type.
    #[error("argument {0} has a different type")]
    WrongType(usize),
}

/// Inclusive token-count range; `max == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    /// Minimum token count.
    pub min: usize,
    /// Maximum token count, if bounded.
    pub max: Option<usize>,
}

impl Arity {
    /// Whether `count` tokens are acceptable.
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", self.min),
            Some(max) => write!(f, "{}..={}", self.min, max),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// Arity plus positional parsers for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    arity: Arity,
    kinds: Vec<ArgKind>,
}

impl ArgumentSpec {
    /// A command that takes no arguments.
    pub fn none() -> Self {
        Self::range(0, Some(0))
    }

    /// Exactly `count` tokens.
    pub fn exact(count: usize) -> Self {
        Self::range(count, Some(count))
    }

    /// At least `min` tokens, no upper bound.
    pub fn at_least(min: usize) -> Self {
        Self::range(min, None)
    }

    /// Between `min` and `max` tokens (inclusive); `None` is unbounded.
    pub fn range(min: usize, max: Option<usize>) -> Self {
        Self {
            arity: Arity { min, max },
            kinds: Vec::new(),
        }
    }

    /// Declare the parser for the next positional argument.
    pub fn arg(mut self, kind: ArgKind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// The accepted token-count range.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Declared positional parsers.
    pub fn kinds(&self) -> &[ArgKind] {
        &self.kinds
    }

    /// Validate and convert `tokens`.
    pub fn parse(&self, tokens: &[&str]) -> Result<ParsedArgs, ArgError> {
        if !self.arity.accepts(tokens.len()) {
            return Err(ArgError::Arity {
                range: self.arity,
                got: tokens.len(),
            });
        }

        let mut values = Vec::with_capacity(tokens.len());
        for (position, token) in tokens.iter().enumerate() {
            let kind = self.kinds.get(position).copied().unwrap_or(ArgKind::Word);
            let value = match kind {
                ArgKind::Word => ArgValue::Text((*token).to_string()),
                ArgKind::Upper => ArgValue::Text(token.to_ascii_uppercase()),
                ArgKind::Int => token
                    .parse::<i64>()
                    .map(ArgValue::Int)
                    .map_err(|_| ArgError::NotAnInteger {
                        position,
                        token: (*token).to_string(),
                    })?,
                ArgKind::Bool => ArgValue::Bool(parse_bool(token).ok_or_else(|| {
                    ArgError::NotABoolean {
                        position,
                        token: (*token).to_string(),
                    }
                })?),
                ArgKind::Sentence => {
                    values.push(ArgValue::Text(tokens[position..].join(" ")));
                    break;
                }
            };
            values.push(value);
        }

        Ok(ParsedArgs { values })
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Converted arguments, indexed by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    values: Vec<ArgValue>,
}

impl ParsedArgs {
    /// Number of converted arguments (a sentence counts as one).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no arguments were supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw access to a value.
    pub fn get(&self, position: usize) -> Option<&ArgValue> {
        self.values.get(position)
    }

    /// Text argument at `position`.
    pub fn text(&self, position: usize) -> Result<&str, ArgError> {
        match self.values.get(position) {
            Some(ArgValue::Text(s)) => Ok(s),
            Some(_) => Err(ArgError::WrongType(position)),
            None => Err(ArgError::Missing(position)),
        }
    }

    /// Optional text argument at `position`.
    pub fn opt_text(&self, position: usize) -> Option<&str> {
        self.text(position).ok()
    }

    /// Integer argument at `position`.
    pub fn int(&self, position: usize) -> Result<i64, ArgError> {
        match self.values.get(position) {
            Some(ArgValue::Int(n)) => Ok(*n),
            Some(_) => Err(ArgError::WrongType(position)),
            None => Err(ArgError::Missing(position)),
        }
    }

    /// Boolean argument at `position`.
    pub fn bool(&self, position: usize) -> Result<bool, ArgError> {
        match self.values.get(position) {
            Some(ArgValue::Bool(b)) => Ok(*b),
            Some(_) => Err(ArgError::WrongType(position)),
            None => Err(ArgError::Missing(position)),
        }
    }
}
