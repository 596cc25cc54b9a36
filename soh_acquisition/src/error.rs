use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcqError {
    #[error("request timeout")]
    Timeout,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("http status {0}")]
    Http(u16),
    #[error("incomplete data: field '{0}' missing or empty")]
    Incomplete(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("request error: {0}")]
    Request(String),
}

impl From<reqwest::Error> for AcqError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connection(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, AcqError>;
