//! Boundary checks for ping requests.

use feedwatch::ClientKey;

use crate::error::FeedError;

/// A ping that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingRequest {
    pub key: ClientKey,
    pub interval_seconds: u64,
}

impl PingRequest {
    /// Validate the raw path segments of `/feed/{email}/{client}/{interval}`.
    pub fn parse(email: String, client: String, interval: &str) -> Result<Self, FeedError> {
        validate_segment("email", &email)?;
        validate_segment("client", &client)?;
        // The address goes into the `To:` header verbatim.
        if !email.is_ascii() {
            return Err(FeedError::NonAsciiEmail);
        }
        let interval_seconds = parse_interval(interval)?;

        Ok(Self { key: ClientKey { email, client }, interval_seconds })
    }
}

/// Email and client end up in mail headers, so no line breaks or other
/// control characters.
fn validate_segment(field: &'static str, value: &str) -> Result<(), FeedError> {
    if value.is_empty() {
        return Err(FeedError::Empty { field });
    }

    if value.chars().any(char::is_control) {
        return Err(FeedError::ControlCharacter { field });
    }

    Ok(())
}

/// Non-negative integer seconds. Negative numbers are rejected, not clamped.
fn parse_interval(raw: &str) -> Result<u64, FeedError> {
    raw.parse::<u64>().map_err(|_| FeedError::Interval(raw.to_owned()))
}
