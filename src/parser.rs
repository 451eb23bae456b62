//! Protobuf parser for GTFS Realtime feeds.

use prost::Message;

use crate::error::DecodeError;
use crate::gtfs_rt::FeedMessage;

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// Decoding is all-or-nothing. Optional fields the provider leaves out
/// (an entity without a trip update, a stop without an arrival) decode as
/// absent, not as errors.
///
/// # Errors
///
/// Returns an error if the bytes are not valid protobuf for a `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage, DecodeError> {
    Ok(FeedMessage::decode(bytes)?)
}
