//! /tf and /tf_static → `adu.common.TransformStampeds`

use byteorder::{LittleEndian, ReadBytesExt};
use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};
use std::io::Read;

use crate::error::TranscodeError;
use crate::record::proto::ProtoDesc;
use crate::rosbags_io::SourceMessage;

/// Destination message type of the transform channels
pub const TRANSFORM_STAMPEDS_TYPE: &str = "adu.common.TransformStampeds";

/// ROS data types accepted on the transform channels
pub const TF_SOURCE_TYPES: &[&str] = &["tf2_msgs/TFMessage", "tf/tfMessage"];

// Destination messages (`package adu.common`)

#[derive(Clone, PartialEq, Message)]
pub struct Header {
    #[prost(double, optional, tag = "1")]
    pub timestamp_sec: Option<f64>,
    #[prost(string, optional, tag = "2")]
    pub module_name: Option<String>,
    #[prost(uint32, optional, tag = "3")]
    pub sequence_num: Option<u32>,
    #[prost(string, optional, tag = "9")]
    pub frame_id: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Point3D {
    #[prost(double, optional, tag = "1")]
    pub x: Option<f64>,
    #[prost(double, optional, tag = "2")]
    pub y: Option<f64>,
    #[prost(double, optional, tag = "3")]
    pub z: Option<f64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Quaternion {
    #[prost(double, optional, tag = "1")]
    pub qx: Option<f64>,
    #[prost(double, optional, tag = "2")]
    pub qy: Option<f64>,
    #[prost(double, optional, tag = "3")]
    pub qz: Option<f64>,
    #[prost(double, optional, tag = "4")]
    pub qw: Option<f64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Transform {
    #[prost(message, optional, tag = "1")]
    pub translation: Option<Point3D>,
    #[prost(message, optional, tag = "2")]
    pub rotation: Option<Quaternion>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransformStamped {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(string, optional, tag = "2")]
    pub child_frame_id: Option<String>,
    #[prost(message, optional, tag = "3")]
    pub transform: Option<Transform>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransformStampeds {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(message, repeated, tag = "2")]
    pub transforms: Vec<TransformStamped>,
}

// ROS1 wire types (`tf2_msgs/TFMessage`)

#[derive(Debug, Clone, PartialEq)]
pub struct RosTransformStamped {
    pub seq: u32,
    pub stamp_secs: u32,
    pub stamp_nsecs: u32,
    pub frame_id: String,
    pub child_frame_id: String,
    pub translation: [f64; 3],
    /// [x, y, z, w]
    pub rotation: [f64; 4],
}

/// Decode a ROS1 `tf2_msgs/TFMessage`: a length-prefixed array of `TransformStamped`
pub fn parse_tf_message(payload: &[u8]) -> std::io::Result<Vec<RosTransformStamped>> {
    let mut rd = payload;
    let count = rd.read_u32::<LittleEndian>()?;
    let mut transforms = Vec::new();
    for _ in 0..count {
        transforms.push(parse_transform_stamped(&mut rd)?);
    }
    Ok(transforms)
}

fn parse_transform_stamped(rd: &mut &[u8]) -> std::io::Result<RosTransformStamped> {
    let seq = rd.read_u32::<LittleEndian>()?;
    let stamp_secs = rd.read_u32::<LittleEndian>()?;
    let stamp_nsecs = rd.read_u32::<LittleEndian>()?;
    let frame_id = read_string(rd)?;
    let child_frame_id = read_string(rd)?;
    let mut translation = [0.0; 3];
    rd.read_f64_into::<LittleEndian>(&mut translation)?;
    let mut rotation = [0.0; 4];
    rd.read_f64_into::<LittleEndian>(&mut rotation)?;
    Ok(RosTransformStamped {
        seq,
        stamp_secs,
        stamp_nsecs,
        frame_id,
        child_frame_id,
        translation,
        rotation,
    })
}

fn read_string(rd: &mut &[u8]) -> std::io::Result<String> {
    let len = rd.read_u32::<LittleEndian>()? as usize;
    if len > rd.len() {
        return Err(std::io::ErrorKind::UnexpectedEof.into());
    }
    let mut bytes = vec![0u8; len];
    rd.read_exact(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Build the aggregate message, one entry per source transform, in source order.
/// Components are copied as recorded, without renormalizing the rotation.
pub fn to_transform_stampeds(transforms: &[RosTransformStamped]) -> TransformStampeds {
    let mut out = TransformStampeds {
        header: None,
        transforms: Vec::with_capacity(transforms.len()),
    };
    for tf in transforms {
        out.transforms.push(TransformStamped {
            header: Some(Header {
                timestamp_sec: Some(tf.stamp_secs as f64 + tf.stamp_nsecs as f64 * 1e-9),
                module_name: None,
                sequence_num: Some(tf.seq),
                frame_id: Some(tf.frame_id.clone()),
            }),
            child_frame_id: Some(tf.child_frame_id.clone()),
            transform: Some(Transform {
                translation: Some(Point3D {
                    x: Some(tf.translation[0]),
                    y: Some(tf.translation[1]),
                    z: Some(tf.translation[2]),
                }),
                rotation: Some(Quaternion {
                    qx: Some(tf.rotation[0]),
                    qy: Some(tf.rotation[1]),
                    qz: Some(tf.rotation[2]),
                    qw: Some(tf.rotation[3]),
                }),
            }),
        });
    }
    out
}

pub fn tf_to_transform_stampeds(msg: &SourceMessage<'_>) -> Result<Vec<u8>, TranscodeError> {
    if !TF_SOURCE_TYPES.contains(&msg.data_type) {
        return Err(TranscodeError::decode(
            msg.topic,
            format!("expected a TF message, got {}", msg.data_type),
        ));
    }
    let transforms = parse_tf_message(msg.data).map_err(|e| TranscodeError::decode(msg.topic, e))?;
    Ok(to_transform_stampeds(&transforms).encode_to_vec())
}

fn field(
    name: &str,
    number: i32,
    ty: Type,
    label: Label,
    type_name: Option<&str>,
) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(ty as i32),
        type_name: type_name.map(str::to_string),
        ..Default::default()
    }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto { name: Some(name.to_string()), field: fields, ..Default::default() }
}

/// Serialized `ProtoDesc` of `adu.common.TransformStampeds`, registered with the
/// transform channels so readers can decode them without generated code
pub fn transform_stampeds_desc() -> Vec<u8> {
    use Label::{Optional, Repeated};

    let file = FileDescriptorProto {
        name: Some("modules/common/proto/transform.proto".to_string()),
        package: Some("adu.common".to_string()),
        message_type: vec![
            message(
                "Header",
                vec![
                    field("timestamp_sec", 1, Type::Double, Optional, None),
                    field("module_name", 2, Type::String, Optional, None),
                    field("sequence_num", 3, Type::Uint32, Optional, None),
                    field("frame_id", 9, Type::String, Optional, None),
                ],
            ),
            message(
                "Point3D",
                vec![
                    field("x", 1, Type::Double, Optional, None),
                    field("y", 2, Type::Double, Optional, None),
                    field("z", 3, Type::Double, Optional, None),
                ],
            ),
            message(
                "Quaternion",
                vec![
                    field("qx", 1, Type::Double, Optional, None),
                    field("qy", 2, Type::Double, Optional, None),
                    field("qz", 3, Type::Double, Optional, None),
                    field("qw", 4, Type::Double, Optional, None),
                ],
            ),
            message(
                "Transform",
                vec![
                    field("translation", 1, Type::Message, Optional, Some(".adu.common.Point3D")),
                    field("rotation", 2, Type::Message, Optional, Some(".adu.common.Quaternion")),
                ],
            ),
            message(
                "TransformStamped",
                vec![
                    field("header", 1, Type::Message, Optional, Some(".adu.common.Header")),
                    field("child_frame_id", 2, Type::String, Optional, None),
                    field("transform", 3, Type::Message, Optional, Some(".adu.common.Transform")),
                ],
            ),
            message(
                "TransformStampeds",
                vec![
                    field("header", 1, Type::Message, Optional, Some(".adu.common.Header")),
                    field(
                        "transforms",
                        2,
                        Type::Message,
                        Repeated,
                        Some(".adu.common.TransformStamped"),
                    ),
                ],
            ),
        ],
        syntax: Some("proto2".to_string()),
        ..Default::default()
    };

    ProtoDesc { desc: Some(file.encode_to_vec()), dependencies: Vec::new() }.encode_to_vec()
}
