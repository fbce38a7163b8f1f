use anyhow::{Context, Result};
use rosbag::{ChunkRecord, MessageRecord, RosBag};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::{BoxError, ConvertError};

/// One message of the source bag, borrowed from its chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceMessage<'a> {
    pub topic: &'a str,
    /// ROS data type declared by the connection, e.g. `tf2_msgs/TFMessage`
    pub data_type: &'a str,
    /// Capture time in nanoseconds
    pub time: u64,
    pub data: &'a [u8],
}

/// Connection id -> (topic, data type)
pub type Connections = BTreeMap<u32, (String, String)>;

/// Open a bag for reading, rejecting missing or empty files up front
pub fn open_bag(path: &str) -> Result<RosBag, ConvertError> {
    let fail = |source: BoxError| ConvertError::SourceOpen { path: path.into(), source };

    let meta = std::fs::metadata(Path::new(path)).map_err(|e| fail(e.into()))?;
    if !meta.is_file() {
        return Err(fail("not a regular file".into()));
    }
    if meta.len() == 0 {
        return Err(fail("file is empty".into()));
    }
    RosBag::new(path).map_err(|e| {
        fail(anyhow::Error::new(e).context("the input file is not a ros bag file").into())
    })
}

/// Materialize every chunk record of the bag. The iterator may not be restartable,
/// so both conversion passes run over this vector.
pub fn read_chunks(bag: &RosBag) -> Result<Vec<ChunkRecord<'_>>> {
    bag.chunk_records()
        .collect::<Result<Vec<_>, _>>()
        .context("failed to read bag chunks")
}

pub fn collect_connections(chunks: &[ChunkRecord<'_>]) -> Result<Connections> {
    let mut connections = BTreeMap::new();
    for record in chunks {
        if let ChunkRecord::Chunk(chunk) = record {
            for msg in chunk.messages() {
                if let MessageRecord::Connection(conn) = msg? {
                    connections.insert(conn.id, (conn.topic.to_string(), conn.tp.to_string()));
                }
            }
        }
    }
    Ok(connections)
}

/// Messages on `topics`, sorted by timestamp. The sort is stable, so messages
/// sharing a timestamp keep their order in the bag.
pub fn collect_messages<'a>(
    chunks: &'a [ChunkRecord<'_>],
    connections: &'a Connections,
    topics: &HashSet<&str>,
) -> Result<Vec<SourceMessage<'a>>> {
    let mut messages = Vec::new();
    for record in chunks {
        if let ChunkRecord::Chunk(chunk) = record {
            for msg in chunk.messages() {
                if let MessageRecord::MessageData(msg_data) = msg?
                    && let Some((topic, tp)) = connections.get(&msg_data.conn_id)
                    && topics.contains(topic.as_str())
                {
                    messages.push(SourceMessage {
                        topic,
                        data_type: tp,
                        time: msg_data.time,
                        data: msg_data.data,
                    });
                }
            }
        }
    }
    messages.sort_by_key(|m| m.time);
    Ok(messages)
}

/// Print topics, types, message counts and time span of a bag
pub fn print_summary(path: &str) -> Result<()> {
    let bag = RosBag::new(path).with_context(|| format!("failed to open bag: {}", path))?;
    let chunks = read_chunks(&bag)?;
    let connections = collect_connections(&chunks)?;

    #[derive(Default)]
    struct Stat { ty: String, count: u64 }
    let mut stats: BTreeMap<&str, Stat> = BTreeMap::new();
    let mut first = u64::MAX;
    let mut last = 0u64;
    let mut total: u64 = 0;

    for record in &chunks {
        if let ChunkRecord::Chunk(chunk) = record {
            for msg in chunk.messages() {
                if let MessageRecord::MessageData(msg_data) = msg?
                    && let Some((topic, tp)) = connections.get(&msg_data.conn_id)
                {
                    let entry = stats
                        .entry(topic.as_str())
                        .or_insert_with(|| Stat { ty: tp.clone(), count: 0 });
                    entry.count += 1;
                    first = first.min(msg_data.time);
                    last = last.max(msg_data.time);
                    total += 1;
                }
            }
        }
    }

    let duration = if total > 0 { (last - first) as f64 / 1_000_000_000.0 } else { 0.0 };
    println!("path:        {}", path);
    println!("duration:    {:.6}s", duration);
    println!("messages:    {}", total);
    println!("{:<40} {:<40} {:>7}", "Topic", "Type", "Count");
    println!("{}", "-".repeat(89));
    for (topic, st) in stats.iter() {
        println!("{:<40} {:<40} {:>7}", topic, st.ty, st.count);
    }

    Ok(())
}
