/// Structuring-stage failures. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum StructuringError {
    #[error("missing API key: set {0}")]
    MissingApiKey(&'static str),

    #[error("network error: {0}")]
    Network(String),

    #[error("{provider} API error: {status} {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("empty response from the language model")]
    EmptyResponse,

    /// The model answered, but not with an account statement.
    #[error("response does not match the statement shape: {0}")]
    Shape(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, StructuringError>;
