//! Cyber RT `.record` container: writer, minimal reader and summary

pub mod proto;

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use prost::Message;

use crate::error::RecordError;
use proto::{
    single_index::Cache, Channel, ChannelCache, ChunkBody, ChunkBodyCache, ChunkHeader,
    ChunkHeaderCache, CompressType, Header, Index, SectionType, SingleIndex, SingleMessage,
};

/// Size of the fixed `{ type: i32, pad: u32, size: i64 }` prefix of every section
pub const SECTION_LENGTH: u64 = 16;
/// The header section body is zero padded to this many bytes
pub const HEADER_LENGTH: u64 = 2048;

const MAJOR_VERSION: u32 = 1;
const MINOR_VERSION: u32 = 0;

/// Destination side of the pipeline: channel registration and message append.
///
/// Implementations do not deduplicate registrations; callers register each
/// channel at most once.
pub trait RecordSink {
    fn write_channel(
        &mut self,
        name: &str,
        message_type: &str,
        proto_desc: &[u8],
    ) -> Result<(), RecordError>;

    fn write_message(
        &mut self,
        channel: &str,
        content: &[u8],
        time_ns: u64,
    ) -> Result<(), RecordError>;

    fn close(self) -> Result<(), RecordError>
    where
        Self: Sized;
}

/// Chunking parameters of a record file
#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    /// Maximum time span of one chunk, in nanoseconds
    pub chunk_interval_ns: u64,
    /// Maximum payload bytes buffered in one chunk
    pub chunk_raw_size: u64,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            chunk_interval_ns: 20_000_000_000,
            chunk_raw_size: 200 * 1024 * 1024,
        }
    }
}

#[derive(Default)]
struct ActiveChunk {
    begin_time: u64,
    end_time: u64,
    raw_size: u64,
    messages: Vec<SingleMessage>,
}

impl ActiveChunk {
    fn push(&mut self, message: SingleMessage, time_ns: u64, len: u64) {
        if self.messages.is_empty() {
            self.begin_time = time_ns;
            self.end_time = time_ns;
        } else {
            self.begin_time = self.begin_time.min(time_ns);
            self.end_time = self.end_time.max(time_ns);
        }
        self.raw_size += len;
        self.messages.push(message);
    }
}

pub struct RecordWriter {
    path: PathBuf,
    file: BufWriter<File>,
    position: u64,
    header: Header,
    options: WriterOptions,
    index: Vec<SingleIndex>,
    // channel name -> slot in `index`
    channel_slots: HashMap<String, usize>,
    message_counts: HashMap<String, u64>,
    chunk: ActiveChunk,
}

impl RecordWriter {
    /// Create (truncate) the record file and write a provisional header
    pub fn create(path: impl AsRef<Path>, options: WriterOptions) -> Result<Self, RecordError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let header = Header {
            major_version: Some(MAJOR_VERSION),
            minor_version: Some(MINOR_VERSION),
            compress: Some(CompressType::CompressNone as i32),
            chunk_interval: Some(options.chunk_interval_ns),
            segment_interval: Some(0),
            index_position: Some(0),
            chunk_number: Some(0),
            channel_number: Some(0),
            begin_time: Some(0),
            end_time: Some(0),
            message_number: Some(0),
            size: Some(0),
            is_complete: Some(false),
            chunk_raw_size: Some(options.chunk_raw_size),
            segment_raw_size: Some(0),
        };
        let mut writer = Self {
            path,
            file: BufWriter::new(file),
            position: 0,
            header,
            options,
            index: Vec::new(),
            channel_slots: HashMap::new(),
            message_counts: HashMap::new(),
            chunk: ActiveChunk::default(),
        };
        let header = writer.header.clone();
        writer.append_section(SectionType::SectionHeader, &header)?;
        tracing::debug!(path = %writer.path.display(), "opened record file");
        Ok(writer)
    }

    fn append_section<M: Message>(
        &mut self,
        ty: SectionType,
        message: &M,
    ) -> Result<u64, RecordError> {
        let position = self.position;
        let bytes = encode_section(ty, message);
        self.file.write_all(&bytes)?;
        self.position += bytes.len() as u64;
        Ok(position)
    }

    fn flush_chunk(&mut self) -> Result<(), RecordError> {
        if self.chunk.messages.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::take(&mut self.chunk);
        let count = chunk.messages.len() as u64;

        let chunk_header = ChunkHeader {
            begin_time: Some(chunk.begin_time),
            end_time: Some(chunk.end_time),
            message_number: Some(count),
            raw_size: Some(chunk.raw_size),
        };
        let header_pos = self.append_section(SectionType::SectionChunkHeader, &chunk_header)?;
        self.index.push(SingleIndex {
            r#type: Some(SectionType::SectionChunkHeader as i32),
            position: Some(header_pos),
            cache: Some(Cache::ChunkHeaderCache(ChunkHeaderCache {
                message_number: Some(count),
                begin_time: Some(chunk.begin_time),
                end_time: Some(chunk.end_time),
                raw_size: Some(chunk.raw_size),
            })),
        });

        let body = ChunkBody { messages: chunk.messages };
        let body_pos = self.append_section(SectionType::SectionChunkBody, &body)?;
        self.index.push(SingleIndex {
            r#type: Some(SectionType::SectionChunkBody as i32),
            position: Some(body_pos),
            cache: Some(Cache::ChunkBodyCache(ChunkBodyCache {
                message_number: Some(count),
            })),
        });

        let chunks = self.header.chunk_number.unwrap_or(0);
        self.header.chunk_number = Some(chunks + 1);
        tracing::debug!(messages = count, raw_size = chunk.raw_size, "flushed chunk");
        Ok(())
    }
}

impl RecordSink for RecordWriter {
    fn write_channel(
        &mut self,
        name: &str,
        message_type: &str,
        proto_desc: &[u8],
    ) -> Result<(), RecordError> {
        if self.channel_slots.contains_key(name) {
            return Err(RecordError::DuplicateChannel(name.to_string()));
        }
        let channel = Channel {
            name: Some(name.to_string()),
            message_type: Some(message_type.to_string()),
            proto_desc: Some(proto_desc.to_vec()),
        };
        let position = self.append_section(SectionType::SectionChannel, &channel)?;
        self.channel_slots.insert(name.to_string(), self.index.len());
        self.index.push(SingleIndex {
            r#type: Some(SectionType::SectionChannel as i32),
            position: Some(position),
            cache: Some(Cache::ChannelCache(ChannelCache {
                message_number: Some(0),
                name: channel.name,
                message_type: channel.message_type,
                proto_desc: channel.proto_desc,
            })),
        });
        let channels = self.header.channel_number.unwrap_or(0);
        self.header.channel_number = Some(channels + 1);
        Ok(())
    }

    fn write_message(
        &mut self,
        channel: &str,
        content: &[u8],
        time_ns: u64,
    ) -> Result<(), RecordError> {
        if !self.channel_slots.contains_key(channel) {
            tracing::debug!(channel, "writing message on a channel without registration");
        }
        let message = SingleMessage {
            channel_name: Some(channel.to_string()),
            time: Some(time_ns),
            content: Some(content.to_vec()),
        };
        self.chunk.push(message, time_ns, content.len() as u64);
        *self.message_counts.entry(channel.to_string()).or_insert(0) += 1;

        let total = self.header.message_number.unwrap_or(0);
        if total == 0 {
            self.header.begin_time = Some(time_ns);
            self.header.end_time = Some(time_ns);
        } else {
            self.header.begin_time = self.header.begin_time.map(|t| t.min(time_ns));
            self.header.end_time = self.header.end_time.map(|t| t.max(time_ns));
        }
        self.header.message_number = Some(total + 1);

        let span = self.chunk.end_time - self.chunk.begin_time;
        let WriterOptions { chunk_interval_ns, chunk_raw_size } = self.options;
        if (chunk_interval_ns > 0 && span > chunk_interval_ns)
            || (chunk_raw_size > 0 && self.chunk.raw_size > chunk_raw_size)
        {
            self.flush_chunk()?;
        }
        Ok(())
    }

    /// Flush the last chunk, append the index and rewrite the header as complete
    fn close(mut self) -> Result<(), RecordError> {
        self.flush_chunk()?;

        for (name, slot) in &self.channel_slots {
            let count = self.message_counts.get(name).copied().unwrap_or(0);
            if let Some(Cache::ChannelCache(cache)) = self.index[*slot].cache.as_mut() {
                cache.message_number = Some(count);
            }
        }

        let index = Index { indexes: std::mem::take(&mut self.index) };
        let index_pos = self.append_section(SectionType::SectionIndex, &index)?;

        self.header.index_position = Some(index_pos);
        self.header.size = Some(self.position);
        self.header.is_complete = Some(true);

        let header_bytes = encode_section(SectionType::SectionHeader, &self.header);
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&header_bytes)?;
        self.file.flush()?;
        self.file.get_ref().sync_all()?;

        tracing::debug!(
            path = %self.path.display(),
            messages = self.header.message_number.unwrap_or(0),
            chunks = self.header.chunk_number.unwrap_or(0),
            "closed record file"
        );
        Ok(())
    }
}

fn encode_section<M: Message>(ty: SectionType, message: &M) -> Vec<u8> {
    let body = message.encode_to_vec();
    let mut out = Vec::with_capacity(SECTION_LENGTH as usize + body.len());
    out.extend_from_slice(&(ty as i32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(body.len() as i64).to_le_bytes());
    out.extend_from_slice(&body);
    if ty == SectionType::SectionHeader {
        let padding = (HEADER_LENGTH as usize).saturating_sub(body.len());
        out.resize(out.len() + padding, 0);
    }
    out
}

/// Everything stored in a record file, in file order
#[derive(Debug, Default)]
pub struct RecordContents {
    pub header: Header,
    pub channels: Vec<Channel>,
    pub messages: Vec<SingleMessage>,
    pub index: Option<Index>,
}

/// Read a whole record file section by section
///
/// Section sizes are checked against the file length before any body is read.
pub fn read_record(path: impl AsRef<Path>) -> Result<RecordContents, RecordError> {
    let file = File::open(path.as_ref())?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let mut position = 0u64;
    let mut contents = RecordContents::default();

    loop {
        let ty = match reader.read_i32::<LittleEndian>() {
            Ok(ty) => ty,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        let _pad = reader.read_u32::<LittleEndian>()?;
        let declared = reader.read_i64::<LittleEndian>()?;
        position += SECTION_LENGTH;
        let remaining = file_len.saturating_sub(position);
        let size = u64::try_from(declared)
            .ok()
            .filter(|size| *size <= remaining)
            .ok_or(RecordError::SectionSize { size: declared, remaining })?;
        let mut body = vec![0u8; size as usize];
        reader.read_exact(&mut body)?;
        position += size;

        match SectionType::try_from(ty).map_err(|_| RecordError::UnknownSection(ty))? {
            SectionType::SectionHeader => {
                contents.header = Header::decode(body.as_slice())?;
                let padding = HEADER_LENGTH.saturating_sub(size);
                let mut pad = (&mut reader).take(padding);
                position += std::io::copy(&mut pad, &mut std::io::sink())?;
            }
            SectionType::SectionChannel => {
                contents.channels.push(Channel::decode(body.as_slice())?);
            }
            SectionType::SectionChunkHeader => {
                ChunkHeader::decode(body.as_slice())?;
            }
            SectionType::SectionChunkBody => {
                let chunk = ChunkBody::decode(body.as_slice())?;
                contents.messages.extend(chunk.messages);
            }
            SectionType::SectionIndex => contents.index = Some(Index::decode(body.as_slice())?),
        }
    }

    Ok(contents)
}

/// Print a short description of a record file, in the spirit of `cyber_recorder info`
pub fn print_summary(path: &str) -> Result<(), RecordError> {
    let contents = read_record(path)?;
    let header = &contents.header;
    let begin = header.begin_time.unwrap_or(0);
    let end = header.end_time.unwrap_or(0);

    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for message in &contents.messages {
        *counts.entry(message.channel_name.as_deref().unwrap_or("")).or_insert(0) += 1;
    }

    println!("record_file:    {}", path);
    println!(
        "version:        {}.{}",
        header.major_version.unwrap_or(0),
        header.minor_version.unwrap_or(0)
    );
    println!("duration:       {:.6} Seconds", end.saturating_sub(begin) as f64 / 1_000_000_000.0);
    println!("begin_time:     {}", begin);
    println!("end_time:       {}", end);
    println!("size:           {} Bytes", header.size.unwrap_or(0));
    println!("is_complete:    {}", header.is_complete.unwrap_or(false));
    println!("message_number: {}", header.message_number.unwrap_or(0));
    println!("channel_number: {}", header.channel_number.unwrap_or(0));
    println!("channel_info:");
    for channel in &contents.channels {
        let name = channel.name.as_deref().unwrap_or("");
        println!(
            "                {:<45} {:>7} messages: {}",
            name,
            counts.get(name).copied().unwrap_or(0),
            channel.message_type.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
