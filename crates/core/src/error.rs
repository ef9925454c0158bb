#[derive(Debug, thiserror::Error)]
pub enum AtestadoError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("request index {index} out of range (have {len})")]
    RequestIndexOutOfRange { index: usize, len: usize },
    #[error("suggestion index {index} out of range (have {len})")]
    SuggestionIndexOutOfRange { index: usize, len: usize },
    #[error("line breaks are not allowed in {0}")]
    LineBreakNotAllowed(&'static str),
    #[error("leave start date is invalid: {0}")]
    InvalidStartDate(String),

    #[error("print element not found: #{0}")]
    MissingPrintElement(&'static str),

    #[error("CID search request failed: {0}")]
    CidSearch(#[from] reqwest::Error),
    #[error("malformed CID search payload")]
    MalformedCidPayload,

    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
}

pub type AtestadoResult<T> = std::result::Result<T, AtestadoError>;
