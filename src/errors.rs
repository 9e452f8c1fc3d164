use std::io;
use thiserror::Error;

/// Errors returned by zonemgr.
///
/// Structural and delegation problems are not errors, they are reported as a
/// [`crate::Verdict`].
#[derive(Error, Debug)]
pub enum Error {
    /// A single field failed its constraint. Reported with the field name and
    /// the violated rule.
    #[error("{field}: {rule}")]
    Field { field: &'static str, rule: String },

    /// The zone text could not be tokenized into valid resource records. The
    /// message is the parser's, unmodified.
    #[error("{0}")]
    Syntax(String),

    /// A strict parse could not resolve the zone's origin.
    #[error("no origin: {0}")]
    NoOrigin(String),

    /// A natural key collided and could not be reconciled.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unknown recipe '{0}'")]
    UnknownRecipe(String),

    #[error("zone '{0}' not found")]
    NotFound(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Returns early with a [`Error::Field`].
#[macro_export]
macro_rules! field_error {
    ($field:expr, $($arg:tt)*) => {
        return Err($crate::Error::Field {
            field: $field,
            rule: format!($($arg)*),
        })
    };
}

/// Returns early with a [`std::io::Error`] of the given kind.
#[macro_export]
macro_rules! bail {
    ($kind:ident, $($arg:tt)*) => {
        return Err(std::io::Error::new(
            std::io::ErrorKind::$kind,
            format!($($arg)*),
        ))
    };
}
