use thiserror::Error;

/// Canonical result for the analyzer crates.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Structural misuse of the API: empty join path, duplicate vertex,
    /// non-join-node operand, unknown group handle. Raised before any partial
    /// work is done.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An INCLUDE references a named subquery that the query root does not
    /// declare. The tree is malformed; query validation should have caught it.
    #[error("No named subquery declared: name={0}")]
    UnknownNamedSubquery(String),

    /// A query description (YAML DSL) failed to parse or referenced something
    /// it did not declare.
    #[error("Query description error: {0}")]
    Dsl(String),
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Dsl(e.to_string())
    }
}
