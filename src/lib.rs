//! bag2record - Convert ROS1 .bag files into Apollo Cyber RT .record files
//!
//! Messages on a fixed set of Apollo channels are read from the bag in
//! timestamp order, transcoded to their Cyber RT protobuf form and appended
//! to a record file. Each channel is declared in the record file once,
//! before its first message.
//!
//! # Supported channels
//!
//! - **Protobuf channels**: `/apollo/planning`, `/apollo/canbus/chassis`,
//!   `/apollo/localization/pose`, ... (protobuf payload carried through ROS)
//! - **TF**: `/tf`, `/tf_static` (`tf2_msgs/TFMessage` → `adu.common.TransformStampeds`)
//!
//! # Example
//!
//! ```rust,no_run
//! use bag2record::{convert_bag, ChannelRegistry, ConvertOptions};
//!
//! let registry = ChannelRegistry::apollo();
//! let options = ConvertOptions::for_bag("input.bag");
//! assert_eq!(options.output_path, "input.record");
//!
//! convert_bag(&options, &registry)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod convert;
pub mod error;
pub mod info;
pub mod mappings;
pub mod record;
pub mod registry;
pub mod rosbags_io;

// Re-export main types for convenience
pub use convert::{convert_bag, record_path_for, ConvertOptions, ConvertStats, Pipeline};
pub use error::{ConvertError, RecordError, TranscodeError};
pub use record::{RecordSink, RecordWriter, WriterOptions};
pub use registry::ChannelRegistry;
pub use rosbags_io::SourceMessage;
