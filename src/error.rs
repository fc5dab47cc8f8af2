use thiserror::Error;

/// Failures while turning an inbound request into a query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("missing required parameter `{0}`")]
    Missing(&'static str),

    #[error("invalid value {value:?} for parameter `{name}`: expected a non-negative integer")]
    Invalid { name: &'static str, value: String },
}

/// Failures raised by the search backend, at any point of a query.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to open backend session: {0}")]
    Session(String),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {message}")]
    Malformed { url: String, message: String },

    #[error("backend error: {0}")]
    Other(String),
}

impl BackendError {
    pub fn request(url: &str, source: reqwest::Error) -> BackendError {
        BackendError::Request {
            url: url.to_string(),
            source,
        }
    }

    pub fn malformed(url: &str, message: impl Into<String>) -> BackendError {
        BackendError::Malformed {
            url: url.to_string(),
            message: message.into(),
        }
    }
}
