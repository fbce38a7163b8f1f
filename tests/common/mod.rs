//! Minimal ROS1 bag (format 2.0, uncompressed) builder for fixtures

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

const VERSION_LINE: &[u8] = b"#ROSBAG V2.0\n";
const BAG_HEADER_LEN: usize = 4096;

const OP_MSG_DATA: u8 = 0x02;
const OP_BAG_HEADER: u8 = 0x03;
const OP_INDEX_DATA: u8 = 0x04;
const OP_CHUNK: u8 = 0x05;
const OP_CHUNK_INFO: u8 = 0x06;
const OP_CONNECTION: u8 = 0x07;

#[derive(Default)]
pub struct BagBuilder {
    connections: Vec<(String, String)>,
    // (conn, time ns, payload) in insertion order
    messages: Vec<(u32, u64, Vec<u8>)>,
}

impl BagBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&mut self, topic: &str, tp: &str) -> u32 {
        self.connections.push((topic.to_string(), tp.to_string()));
        (self.connections.len() - 1) as u32
    }

    pub fn message(&mut self, conn: u32, time_ns: u64, data: &[u8]) -> &mut Self {
        self.messages.push((conn, time_ns, data.to_vec()));
        self
    }

    pub fn write(&self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }

    pub fn build(&self) -> Vec<u8> {
        // chunk payload: connection records then message records
        let mut chunk_data = Vec::new();
        for (id, (topic, tp)) in self.connections.iter().enumerate() {
            chunk_data.extend(connection_record(id as u32, topic, tp));
        }
        let mut per_conn: BTreeMap<u32, Vec<(u64, u32)>> = BTreeMap::new();
        for (conn, time, data) in &self.messages {
            per_conn.entry(*conn).or_default().push((*time, chunk_data.len() as u32));
            let header = [
                field("op", &[OP_MSG_DATA]),
                field("conn", &conn.to_le_bytes()),
                field("time", &ros_time(*time)),
            ]
            .concat();
            chunk_data.extend(record(&header, data));
        }

        let chunk_pos = (VERSION_LINE.len() + BAG_HEADER_LEN) as u64;
        let chunk_header = [
            field("op", &[OP_CHUNK]),
            field("compression", b"none"),
            field("size", &(chunk_data.len() as u32).to_le_bytes()),
        ]
        .concat();
        let mut body = record(&chunk_header, &chunk_data);

        for (conn, entries) in &per_conn {
            let header = [
                field("op", &[OP_INDEX_DATA]),
                field("ver", &1u32.to_le_bytes()),
                field("conn", &conn.to_le_bytes()),
                field("count", &(entries.len() as u32).to_le_bytes()),
            ]
            .concat();
            let mut data = Vec::new();
            for (time, offset) in entries {
                data.extend(ros_time(*time));
                data.extend(offset.to_le_bytes());
            }
            body.extend(record(&header, &data));
        }

        let index_pos = chunk_pos + body.len() as u64;
        let mut index = Vec::new();
        for (id, (topic, tp)) in self.connections.iter().enumerate() {
            index.extend(connection_record(id as u32, topic, tp));
        }
        let start = self.messages.iter().map(|m| m.1).min().unwrap_or(0);
        let end = self.messages.iter().map(|m| m.1).max().unwrap_or(0);
        let info_header = [
            field("op", &[OP_CHUNK_INFO]),
            field("ver", &1u32.to_le_bytes()),
            field("chunk_pos", &chunk_pos.to_le_bytes()),
            field("start_time", &ros_time(start)),
            field("end_time", &ros_time(end)),
            field("count", &(per_conn.len() as u32).to_le_bytes()),
        ]
        .concat();
        let mut info_data = Vec::new();
        for (conn, entries) in &per_conn {
            info_data.extend(conn.to_le_bytes());
            info_data.extend((entries.len() as u32).to_le_bytes());
        }
        index.extend(record(&info_header, &info_data));

        let bag_header = [
            field("op", &[OP_BAG_HEADER]),
            field("index_pos", &index_pos.to_le_bytes()),
            field("conn_count", &(self.connections.len() as u32).to_le_bytes()),
            field("chunk_count", &1u32.to_le_bytes()),
        ]
        .concat();
        let padding = vec![b' '; BAG_HEADER_LEN - 8 - bag_header.len()];

        let mut out = VERSION_LINE.to_vec();
        out.extend(record(&bag_header, &padding));
        assert_eq!(out.len() as u64, chunk_pos);
        out.extend(body);
        out.extend(index);
        out
    }
}

fn field(name: &str, value: &[u8]) -> Vec<u8> {
    let mut out = ((name.len() + 1 + value.len()) as u32).to_le_bytes().to_vec();
    out.extend_from_slice(name.as_bytes());
    out.push(b'=');
    out.extend_from_slice(value);
    out
}

fn record(header: &[u8], data: &[u8]) -> Vec<u8> {
    let mut out = (header.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(header);
    out.extend((data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

fn connection_record(id: u32, topic: &str, tp: &str) -> Vec<u8> {
    let header = [
        field("op", &[OP_CONNECTION]),
        field("conn", &id.to_le_bytes()),
        field("topic", topic.as_bytes()),
    ]
    .concat();
    let data = [
        field("topic", topic.as_bytes()),
        field("type", tp.as_bytes()),
        field("md5sum", b"0123456789abcdef0123456789abcdef"),
        field("message_definition", b""),
    ]
    .concat();
    record(&header, &data)
}

fn ros_time(ns: u64) -> [u8; 8] {
    let secs = (ns / 1_000_000_000) as u32;
    let nsecs = (ns % 1_000_000_000) as u32;
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&secs.to_le_bytes());
    out[4..].copy_from_slice(&nsecs.to_le_bytes());
    out
}

/// Protobuf bytes framed the way the ROS serializer stores them
pub fn framed_pb(pb: &[u8]) -> Vec<u8> {
    let mut out = (pb.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(pb);
    out
}

/// `tf2_msgs/TFMessage` payload from (parent, child, translation, rotation xyzw)
pub fn tf_message(transforms: &[(&str, &str, [f64; 3], [f64; 4])]) -> Vec<u8> {
    let mut out = (transforms.len() as u32).to_le_bytes().to_vec();
    for (seq, (parent, child, trans, rot)) in transforms.iter().enumerate() {
        out.extend((seq as u32).to_le_bytes());
        out.extend(1u32.to_le_bytes());
        out.extend(0u32.to_le_bytes());
        out.extend((parent.len() as u32).to_le_bytes());
        out.extend_from_slice(parent.as_bytes());
        out.extend((child.len() as u32).to_le_bytes());
        out.extend_from_slice(child.as_bytes());
        for v in trans.iter().chain(rot.iter()) {
            out.extend(v.to_le_bytes());
        }
    }
    out
}
