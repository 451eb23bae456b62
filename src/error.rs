//! Error types for fetching, decoding and configuring the sensor.
//!
//! Fetch and decode failures both end an update cycle early. They stay
//! distinct here so they can be logged separately, even though the
//! sensor collapses them into the same `Error` state.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("feed endpoint returned HTTP {0}")]
    Status(StatusCode),
    #[error("invalid feed URL: {0}")]
    InvalidUrl(String),
    #[error("invalid API key header: {0}")]
    InvalidHeader(String),
}

#[derive(Debug, Error)]
#[error("malformed GTFS-RT feed: {0}")]
pub struct DecodeError(#[from] pub prost::DecodeError);

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl UpdateError {
    /// Short label for logs, distinguishing which stage of the poll failed.
    pub fn stage(&self) -> &'static str {
        match self {
            UpdateError::Fetch(_) => "fetch",
            UpdateError::Decode(_) => "decode",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config")]
    Parse(#[from] serde_json::Error),
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
