use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "bag2record",
    about = "Convert ROS1 bag files into Apollo Cyber RT record files",
    long_about = "Convert ROS1 bag files into Apollo Cyber RT record files.\n\n\
                  The record file is written next to the bag, with the extension \
                  replaced by `record`.",
    version
)]
pub struct Cli {
    /// Path to the .bag file
    pub bag: String,
}
