use std::io::Error as IoError;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Watchdog error: {0}")]
    Watchdog(#[from] feedwatch::Error),
}

/// Rejections on the feed endpoints. All of them look like a missing page to
/// the client and never reach the watchdog.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("interval {0:?} is not a non-negative integer")]
    Interval(String),
    #[error("{field} is empty")]
    Empty { field: &'static str },
    #[error("{field} contains control characters")]
    ControlCharacter { field: &'static str },
    #[error("email is not an ASCII address")]
    NonAsciiEmail,
}

impl ResponseError for FeedError {
    fn status_code(&self) -> StatusCode {
        StatusCode::NOT_FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::NotFound().body("Not Found")
    }
}
