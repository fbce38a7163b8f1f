//! Human-facing summaries of the source and destination files
//!
//! The summaries come from the ROS and Cyber RT command line tools when they
//! are installed, and from the built-in readers otherwise. Nothing here runs
//! on the conversion path.

use anyhow::Result;
use std::io::ErrorKind;
use std::process::Command;

/// Describes a container file on stdout
pub trait InfoTool {
    /// Returns `Ok(false)` when the tool is not available on this machine
    fn describe(&self, path: &str) -> Result<bool>;
}

/// An external program such as `rosbag info <path>`
#[derive(Debug, Clone)]
pub struct ExternalInfo {
    pub program: String,
    pub args: Vec<String>,
}

impl ExternalInfo {
    pub fn rosbag() -> Self {
        Self { program: "rosbag".to_string(), args: vec!["info".to_string()] }
    }

    pub fn cyber_recorder() -> Self {
        Self {
            program: "cyber_recorder".to_string(),
            args: vec!["info".to_string(), "-f".to_string()],
        }
    }
}

impl InfoTool for ExternalInfo {
    fn describe(&self, path: &str) -> Result<bool> {
        // output goes straight to the terminal; the exit status is only logged
        match Command::new(&self.program).args(&self.args).arg(path).status() {
            Ok(status) => {
                if !status.success() {
                    tracing::debug!(program = %self.program, %status, "info command failed");
                }
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process summary used when the external tool is missing
pub struct BuiltinInfo(pub fn(&str) -> Result<()>);

impl InfoTool for BuiltinInfo {
    fn describe(&self, path: &str) -> Result<bool> {
        (self.0)(path)?;
        Ok(true)
    }
}

/// Try each tool in turn until one describes `path`. Failures are logged,
/// never returned.
pub fn describe(tools: &[&dyn InfoTool], path: &str) {
    for tool in tools {
        match tool.describe(path) {
            Ok(true) => return,
            Ok(false) => continue,
            Err(e) => {
                tracing::warn!(path, "cannot describe file: {e:#}");
                return;
            }
        }
    }
    tracing::debug!(path, "no info tool available");
}

pub fn describe_bag(path: &str) {
    let builtin = BuiltinInfo(crate::rosbags_io::print_summary);
    describe(&[&ExternalInfo::rosbag(), &builtin], path);
}

pub fn describe_record(path: &str) {
    let builtin = BuiltinInfo(|path| Ok(crate::record::print_summary(path)?));
    describe(&[&ExternalInfo::cyber_recorder(), &builtin], path);
}
