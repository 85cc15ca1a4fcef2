use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    NoSubscriptionKey,
    UnknownConfiguration(String),
    ReauthRequired,
    Io(std::io::Error),
}

impl Error {
    /// Configuration errors are the only failures that cross the sync and
    /// command boundaries; everything else is recovered locally.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::NoSubscriptionKey | Error::UnknownConfiguration(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::NoSubscriptionKey => write!(f, "no subscription key configured"),
            Error::UnknownConfiguration(msg) => write!(f, "unknown configuration: {msg}"),
            Error::ReauthRequired => write!(f, "no devices returned, subscription key must be renewed"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
