use thiserror::Error;

use crate::config::ConfigError;

/// The browser session itself became unusable (crashed process, dropped
/// websocket). Fatal to the current run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("browser session fault: {0}")]
pub struct SessionFault(pub String);

#[derive(Error, Debug)]
pub enum PricetapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Session(#[from] SessionFault),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PricetapError>;
