//! Error taxonomy for core operations.
//!
//! Missing data inside a curl command is not an error here: the parser
//! reports it as empty strings. Only conditions a caller must react to get
//! a variant.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrustulaError {
    /// The curl command could not be tokenized (unbalanced quotes, dangling escape).
    #[error("invalid curl command: {0}")]
    MalformedCurl(String),

    /// Jar creation needs a URL to derive the domain from.
    #[error("invalid curl command: no http(s) URL found")]
    MissingUrl,

    #[error("jar not found: {0}")]
    JarNotFound(String),

    #[error("call not found: {0}")]
    CallNotFound(String),

    #[error("call already reported: {0}")]
    CallAlreadyReported(String),

    /// Expected outcome of selection, not a fault.
    #[error("no usable jar for domain: {0}")]
    NoUsableJar(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T, E = CrustulaError> = std::result::Result<T, E>;
