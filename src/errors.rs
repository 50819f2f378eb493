use thiserror::Error;

/// Error taxonomy shared by every analysis entry point.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    /// A named type/method/field is absent from the module.
    #[error("not found: {0}")]
    NotFound(String),
    /// The method is abstract, extern, or P/Invoke and carries no body.
    #[error("method has no body: {0}")]
    NoBody(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Cooperative cancellation honored; no partial data is returned.
    #[error("operation cancelled")]
    Cancelled,
    /// Bug or unmet invariant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Stable machine-readable code for the RPC/CLI envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::NotFound(_) => "not_found",
            AnalysisError::NoBody(_) => "no_body",
            AnalysisError::InvalidInput(_) => "invalid_input",
            AnalysisError::Cancelled => "cancelled",
            AnalysisError::Internal(_) => "internal",
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
