use thiserror::Error;

/// Everything that can make a split fail. All of these are fatal: no output is
/// written once one has been returned.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed ledger: {0}")]
    Malformed(String),
    #[error("missing account reference: {0}")]
    MissingAccount(String),
    #[error("unknown namespace alias '{0}'")]
    UnknownNamespace(String),
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("invalid posting date '{value}': {source}")]
    InvalidDate {
        value: String,
        source: chrono::ParseError,
    },
    #[error("invalid date window: {0}")]
    InvalidWindow(String),
}

pub type Result<T, E = SplitError> = std::result::Result<T, E>;
