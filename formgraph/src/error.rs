//! Module containing the universal error type
use thiserror::Error;

/// Universal error type for `formgraph`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Node is not present in this `Context`
    #[error("node is not present in this `Context`")]
    BadNode,

    /// Variable is not present in this `Context`
    #[error("variable is not present in this `Context`")]
    BadVar,

    /// `IndexMap` is empty
    #[error("`IndexMap` is empty")]
    EmptyMap,

    /// The formula is empty (or only whitespace)
    #[error("formula is empty")]
    EmptyFormula,

    /// The formula ended while more input was expected
    #[error("unexpected end of formula")]
    UnexpectedEnd,

    /// A token appeared where it is not allowed
    #[error("unexpected '{got}' at offset {offset}")]
    UnexpectedToken {
        /// Text of the offending token
        got: String,
        /// Byte offset into the formula
        offset: usize,
    },

    /// The formula is nested more deeply than the parser allows
    #[error("formula is nested too deeply (limit {0})")]
    TooDeep(usize),

    /// A number literal could not be parsed
    #[error("invalid number '{0}'")]
    BadNumber(String),

    /// Function name is not known
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// Identifier is neither a built-in variable, a constant, nor a
    /// registered parameter
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// A function was called with the wrong number of arguments
    #[error("{name} expects {expected} argument(s), got {got}")]
    BadArgCount {
        /// Function name
        name: String,
        /// Number of arguments the function takes
        expected: usize,
        /// Number of arguments provided
        got: usize,
    },

    /// The name collides with a function or constant
    #[error("'{0}' is reserved")]
    ReservedName(String),

    /// The name is not a valid identifier
    #[error("'{0}' is not a valid parameter name")]
    BadName(String),

    /// No parameter with the given name has been defined
    #[error("no such parameter '{0}'")]
    NoSuchParameter(String),

    /// Range must be finite with `min < max`
    #[error("bad range; {0} is not less than {1}")]
    BadRange(f64, f64),

    /// Step must be finite and positive
    #[error("bad step {0}; must be positive")]
    BadStep(f64),

    /// Command was recognized but its arguments were not
    #[error("usage: {0}")]
    Usage(&'static str),

    /// IO error; see inner text for details
    #[error("io error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}
