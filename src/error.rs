//! Error types shared by the conversion pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Boxed cause of a source failure: I/O, `rosbag` or a plain message
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal conditions that abort a conversion run
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to open bag {}: {source}", .path.display())]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("failed to open record file {}: {source}", .path.display())]
    DestinationOpen {
        path: PathBuf,
        #[source]
        source: RecordError,
    },

    #[error("failed to close record file {}: {source}", .path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: RecordError,
    },
}

/// Per-message transcoding failures; the caller skips the message
#[derive(Debug, Error, PartialEq)]
pub enum TranscodeError {
    #[error("no transcode rule for channel {0}")]
    Unsupported(String),

    #[error("cannot decode message on {channel}: {reason}")]
    Decode { channel: String, reason: String },
}

impl TranscodeError {
    pub(crate) fn decode(channel: &str, reason: impl std::fmt::Display) -> Self {
        TranscodeError::Decode {
            channel: channel.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised by the record file writer and reader
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("channel {0} is already registered")]
    DuplicateChannel(String),

    #[error("malformed record section: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("unknown section type {0}")]
    UnknownSection(i32),

    #[error("section size {size} exceeds the {remaining} bytes left in the file")]
    SectionSize { size: i64, remaining: u64 },
}
