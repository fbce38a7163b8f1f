use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{ConvertError, RecordError, TranscodeError};
use crate::mappings::transcode;
use crate::record::{RecordSink, RecordWriter, WriterOptions};
use crate::registry::ChannelRegistry;
use crate::rosbags_io::{self, SourceMessage};

/// Options for converting a ROS bag file to a Cyber RT record file
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Path to the input .bag file
    pub bag_path: String,
    /// Path to the output .record file
    pub output_path: String,
    /// Show progress bar
    pub show_progress: bool,
    /// Chunking of the output file
    pub writer: WriterOptions,
}

impl ConvertOptions {
    /// Options writing next to the bag, see [`record_path_for`]
    pub fn for_bag(bag_path: &str) -> Self {
        Self {
            bag_path: bag_path.to_string(),
            output_path: record_path_for(bag_path),
            show_progress: true,
            writer: WriterOptions::default(),
        }
    }
}

/// Output path of a bag: its extension replaced by `record`
/// (`/data/run.bag` → `/data/run.record`)
pub fn record_path_for(bag_path: &str) -> String {
    Path::new(bag_path).with_extension("record").to_string_lossy().into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    /// Source and destination are open
    Opened,
    ChannelsRegistered,
    Streaming,
    Closed,
}

/// Counters of one conversion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertStats {
    pub total_msgs: u64,
    pub written: u64,
    pub skipped_unsupported: u64,
    pub skipped_transcode: u64,
    pub write_failures: u64,
    pub channels_registered: u64,
    pub registration_failures: u64,
}

/// Drives messages from the source through the transcoder into a [`RecordSink`].
///
/// Every channel is registered at most once and before its first message,
/// whether or not [`Pipeline::register_channels`] ran first.
pub struct Pipeline<'r, S: RecordSink> {
    registry: &'r ChannelRegistry,
    sink: S,
    stage: Stage,
    // channels whose registration was attempted, successful or not
    attempted: HashSet<String>,
    stats: ConvertStats,
}

impl<'r, S: RecordSink> Pipeline<'r, S> {
    pub fn new(registry: &'r ChannelRegistry, sink: S) -> Self {
        Self {
            registry,
            sink,
            stage: Stage::Opened,
            attempted: HashSet::new(),
            stats: ConvertStats::default(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn stats(&self) -> &ConvertStats {
        &self.stats
    }

    /// Discovery pass: register each supported channel on first encounter
    pub fn register_channels(&mut self, messages: &[SourceMessage<'_>]) {
        for msg in messages {
            if self.registry.is_supported(msg.topic) {
                self.ensure_registered(msg.topic);
            }
        }
        self.stage = Stage::ChannelsRegistered;
        tracing::debug!(channels = self.attempted.len(), "channel discovery done");
    }

    fn ensure_registered(&mut self, channel: &str) {
        if self.attempted.contains(channel) {
            return;
        }
        self.attempted.insert(channel.to_string());

        let Some(spec) = self.registry.lookup(channel) else {
            return;
        };
        if spec.lacks_expected_schema() {
            tracing::warn!(
                channel,
                message_type = %spec.message_type,
                "can not find desc or message type"
            );
        } else if spec.proto_desc.is_empty() {
            tracing::debug!(
                channel,
                message_type = %spec.message_type,
                "no descriptor compiled in"
            );
        }
        match self.sink.write_channel(channel, &spec.message_type, &spec.proto_desc) {
            Ok(()) => self.stats.channels_registered += 1,
            Err(e) => {
                self.stats.registration_failures += 1;
                tracing::error!(channel, error = %e, "write channel info failed");
            }
        }
    }

    /// Streaming pass: transcode and write every message in order
    pub fn stream(&mut self, messages: &[SourceMessage<'_>], progress: Option<&ProgressBar>) {
        self.stage = Stage::Streaming;
        for msg in messages {
            self.stats.total_msgs += 1;
            self.process(msg);
            if let Some(pb) = progress {
                pb.inc(1);
            }
        }
    }

    fn process(&mut self, msg: &SourceMessage<'_>) {
        if !self.registry.is_supported(msg.topic) {
            self.stats.skipped_unsupported += 1;
            tracing::debug!(channel = msg.topic, "skipping unsupported channel");
            return;
        }
        let content = match transcode(self.registry, msg) {
            Ok(content) => content,
            Err(e @ TranscodeError::Unsupported(_)) => {
                self.stats.skipped_unsupported += 1;
                tracing::warn!(channel = msg.topic, "not support channel: {e}");
                return;
            }
            Err(e) => {
                self.stats.skipped_transcode += 1;
                tracing::warn!(channel = msg.topic, time = msg.time, "skipping message: {e}");
                return;
            }
        };

        self.ensure_registered(msg.topic);
        match self.sink.write_message(msg.topic, &content, msg.time) {
            Ok(()) => self.stats.written += 1,
            Err(e) => {
                self.stats.write_failures += 1;
                tracing::error!(
                    channel = msg.topic,
                    time = msg.time,
                    error = %e,
                    "write single msg fail"
                );
            }
        }
    }

    /// Close the sink; no writes are possible afterwards
    pub fn finish(mut self) -> Result<ConvertStats, RecordError> {
        self.sink.close()?;
        self.stage = Stage::Closed;
        tracing::debug!(stage = ?self.stage, "pipeline finished");
        Ok(self.stats)
    }
}

/// Convert a ROS bag file to a Cyber RT record file
///
/// Only the two open failures (and a failed close) are fatal; messages that
/// cannot be transcoded or written are logged and skipped.
///
/// # Example
///
/// ```rust,no_run
/// use bag2record::{convert_bag, ChannelRegistry, ConvertOptions};
///
/// let registry = ChannelRegistry::apollo();
/// let stats = convert_bag(&ConvertOptions::for_bag("input.bag"), &registry)?;
/// println!("{} messages written", stats.written);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn convert_bag(
    options: &ConvertOptions,
    registry: &ChannelRegistry,
) -> Result<ConvertStats, ConvertError> {
    let source_err = |e: anyhow::Error| ConvertError::SourceOpen {
        path: options.bag_path.clone().into(),
        source: e.into(),
    };

    tracing::debug!(stage = ?Stage::Idle, bag = %options.bag_path, "opening source");
    let bag = rosbags_io::open_bag(&options.bag_path)?;
    let chunks = rosbags_io::read_chunks(&bag).map_err(source_err)?;
    let connections = rosbags_io::collect_connections(&chunks).map_err(source_err)?;
    let topics: HashSet<&str> = registry.channel_names().collect();
    let messages =
        rosbags_io::collect_messages(&chunks, &connections, &topics).map_err(source_err)?;
    tracing::info!(
        bag = %options.bag_path,
        connections = connections.len(),
        messages = messages.len(),
        "collected supported messages"
    );

    let writer = RecordWriter::create(&options.output_path, options.writer).map_err(|source| {
        ConvertError::DestinationOpen {
            path: options.output_path.clone().into(),
            source,
        }
    })?;

    let mut pipeline = Pipeline::new(registry, writer);
    pipeline.register_channels(&messages);

    let pb = if options.show_progress {
        let pb = ProgressBar::new(messages.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} msgs")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(pb)
    } else {
        None
    };
    pipeline.stream(&messages, pb.as_ref());
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let stats = pipeline.finish().map_err(|source| ConvertError::Close {
        path: options.output_path.clone().into(),
        source,
    })?;
    tracing::info!(
        written = stats.written,
        skipped_unsupported = stats.skipped_unsupported,
        skipped_transcode = stats.skipped_transcode,
        write_failures = stats.write_failures,
        channels = stats.channels_registered,
        "conversion done"
    );
    Ok(stats)
}
