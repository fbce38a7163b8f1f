//! Protobuf messages of the Cyber RT record file format (`apollo.cyber.proto`)

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum SectionType {
    SectionHeader = 0,
    SectionChunkHeader = 1,
    SectionChunkBody = 2,
    SectionIndex = 3,
    SectionChannel = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum CompressType {
    CompressNone = 0,
    CompressBz2 = 1,
    CompressLz4 = 2,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SingleMessage {
    #[prost(string, optional, tag = "1")]
    pub channel_name: Option<String>,
    #[prost(uint64, optional, tag = "2")]
    pub time: Option<u64>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub content: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ChunkHeader {
    #[prost(uint64, optional, tag = "1")]
    pub begin_time: Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    pub end_time: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub message_number: Option<u64>,
    #[prost(uint64, optional, tag = "4")]
    pub raw_size: Option<u64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ChunkBody {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<SingleMessage>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ChannelCache {
    #[prost(uint64, optional, tag = "1")]
    pub message_number: Option<u64>,
    #[prost(string, optional, tag = "2")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub message_type: Option<String>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub proto_desc: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ChunkHeaderCache {
    #[prost(uint64, optional, tag = "1")]
    pub message_number: Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    pub begin_time: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub end_time: Option<u64>,
    #[prost(uint64, optional, tag = "4")]
    pub raw_size: Option<u64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ChunkBodyCache {
    #[prost(uint64, optional, tag = "1")]
    pub message_number: Option<u64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SingleIndex {
    #[prost(enumeration = "SectionType", optional, tag = "1")]
    pub r#type: Option<i32>,
    #[prost(uint64, optional, tag = "2")]
    pub position: Option<u64>,
    #[prost(oneof = "single_index::Cache", tags = "101, 102, 103")]
    pub cache: Option<single_index::Cache>,
}

pub mod single_index {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Cache {
        #[prost(message, tag = "101")]
        ChannelCache(super::ChannelCache),
        #[prost(message, tag = "102")]
        ChunkHeaderCache(super::ChunkHeaderCache),
        #[prost(message, tag = "103")]
        ChunkBodyCache(super::ChunkBodyCache),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Index {
    #[prost(message, repeated, tag = "1")]
    pub indexes: Vec<SingleIndex>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Channel {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub message_type: Option<String>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub proto_desc: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Header {
    #[prost(uint32, optional, tag = "1")]
    pub major_version: Option<u32>,
    #[prost(uint32, optional, tag = "2")]
    pub minor_version: Option<u32>,
    #[prost(enumeration = "CompressType", optional, tag = "3")]
    pub compress: Option<i32>,
    #[prost(uint64, optional, tag = "4")]
    pub chunk_interval: Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub segment_interval: Option<u64>,
    #[prost(uint64, optional, tag = "6")]
    pub index_position: Option<u64>,
    #[prost(uint64, optional, tag = "7")]
    pub chunk_number: Option<u64>,
    #[prost(uint64, optional, tag = "8")]
    pub channel_number: Option<u64>,
    #[prost(uint64, optional, tag = "9")]
    pub begin_time: Option<u64>,
    #[prost(uint64, optional, tag = "10")]
    pub end_time: Option<u64>,
    #[prost(uint64, optional, tag = "11")]
    pub message_number: Option<u64>,
    #[prost(uint64, optional, tag = "12")]
    pub size: Option<u64>,
    #[prost(bool, optional, tag = "13")]
    pub is_complete: Option<bool>,
    #[prost(uint64, optional, tag = "14")]
    pub chunk_raw_size: Option<u64>,
    #[prost(uint64, optional, tag = "15")]
    pub segment_raw_size: Option<u64>,
}

/// Descriptor of a channel's message type together with its imports
#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtoDesc {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub desc: Option<Vec<u8>>,
    #[prost(message, repeated, tag = "2")]
    pub dependencies: Vec<ProtoDesc>,
}
