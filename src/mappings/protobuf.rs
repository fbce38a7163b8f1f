//! Apollo protobuf channels recorded through ROS
//!
//! The ROS serializer stores a protobuf message as a little-endian `u32`
//! length followed by the encoded bytes. Source and destination schemas are
//! the same protobuf type, so the record content is the inner bytes.
//!
//! A payload without that prefix is copied as is. The two cases overlap: bare
//! protobuf whose first four bytes, read as a length, exceed the rest by at
//! most 1 MiB cannot be told apart from a cut framed message and is rejected
//! as truncated.

use crate::error::TranscodeError;
use crate::rosbags_io::SourceMessage;

/// Inner protobuf bytes of `msg`, or a `Decode` error when the prefix claims
/// up to [`MAX_TRUNCATION`] more bytes than the payload holds
pub fn unwrap_protobuf(msg: &SourceMessage<'_>) -> Result<Vec<u8>, TranscodeError> {
    let payload = msg.data;
    if payload.len() < 4 {
        // too short to carry a length prefix: bare protobuf (possibly empty)
        return Ok(payload.to_vec());
    }
    let declared = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
    let body = &payload[4..];
    if declared == body.len() {
        return Ok(body.to_vec());
    }
    if declared > body.len() && looks_like_prefix(declared, body.len()) {
        return Err(TranscodeError::decode(
            msg.topic,
            format!("truncated payload: {} of {} bytes", body.len(), declared),
        ));
    }
    tracing::trace!(channel = msg.topic, "payload has no length prefix, copying as is");
    Ok(payload.to_vec())
}

/// Largest shortfall still read as a truncated framed message
pub const MAX_TRUNCATION: usize = 1 << 20;

fn looks_like_prefix(declared: usize, available: usize) -> bool {
    declared - available <= MAX_TRUNCATION
}
