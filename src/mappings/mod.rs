//! ROS → Cyber RT message transcoding rules

pub mod protobuf;
pub mod tf;

use crate::error::TranscodeError;
use crate::registry::ChannelRegistry;
use crate::rosbags_io::SourceMessage;

/// How a channel's payload is turned into destination bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeRule {
    /// Protobuf message carried inside the ROS serialization
    Protobuf,
    /// `tf2_msgs/TFMessage` → `adu.common.TransformStampeds`
    Transforms,
}

impl TranscodeRule {
    pub fn apply(self, msg: &SourceMessage<'_>) -> Result<Vec<u8>, TranscodeError> {
        match self {
            TranscodeRule::Protobuf => protobuf::unwrap_protobuf(msg),
            TranscodeRule::Transforms => tf::tf_to_transform_stampeds(msg),
        }
    }
}

/// Decode `msg` under its channel's source schema and encode it for the record file
pub fn transcode(
    registry: &ChannelRegistry,
    msg: &SourceMessage<'_>,
) -> Result<Vec<u8>, TranscodeError> {
    let spec = registry
        .lookup(msg.topic)
        .ok_or_else(|| TranscodeError::Unsupported(msg.topic.to_string()))?;
    spec.rule.apply(msg)
}
