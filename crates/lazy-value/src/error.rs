use miette::Diagnostic;
use thiserror::Error;

pub type LazyResult<T> = Result<T, LazyError>;

/// Errors raised while building or executing lazy values.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
pub enum LazyError {
    #[error("Unsupported shape {0:?}, only scalars and 1-D values can be wrapped")]
    #[diagnostic(
        code(lazy_value::unsupported_shape),
        help("Flatten the array or wrap each row in its own lazy value.")
    )]
    UnsupportedShape(Vec<usize>),
    #[error("A length cannot be supplied together with a {0}")]
    #[diagnostic(
        code(lazy_value::length_not_allowed),
        help("Lengths are derived from values and aliased nodes; only functions take one.")
    )]
    LengthNotAllowed(&'static str),
    #[error("Incompatible len: self {}, other {}", display_len(.this), display_len(.other))]
    #[diagnostic(code(lazy_value::incompatible_length))]
    IncompatibleLength {
        this: Option<usize>,
        other: Option<usize>,
    },
    #[error("Unsupported operation: {0}")]
    #[diagnostic(code(lazy_value::unsupported))]
    Unsupported(String),
    #[error("Index {index} out of range for length {length}")]
    #[diagnostic(code(lazy_value::index_out_of_range))]
    IndexOutOfRange { index: usize, length: usize },
    #[error("len() of unsized lazy value")]
    #[diagnostic(code(lazy_value::no_length))]
    NoLength,
    #[error("Maximum execution depth exceeded \"{0}\"")]
    #[diagnostic(
        code(lazy_value::recursion),
        help("A node was probably assigned an expression that depends on itself.")
    )]
    RecursionError(u32),
    #[error("{0}")]
    #[diagnostic(code(lazy_value::user_defined))]
    UserDefined(String),
}

fn display_len(length: &Option<usize>) -> String {
    length.map_or_else(|| "None".to_string(), |l| l.to_string())
}
