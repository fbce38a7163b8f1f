use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, fmt};

use bag2record::cli::Cli;
use bag2record::{convert_bag, info, ChannelRegistry, ConvertOptions};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let registry = ChannelRegistry::apollo();
    let options = ConvertOptions::for_bag(&cli.bag);

    let start = Instant::now();
    // checked before the summary so a bad path fails without running any tool
    bag2record::rosbags_io::open_bag(&options.bag_path)?;

    println!("Info of ros bag file");
    info::describe_bag(&options.bag_path);

    let stats = convert_bag(&options, &registry)?;

    println!("Info of record file");
    info::describe_record(&options.output_path);

    println!(
        "Conversion finished! {} messages written, {} skipped. Took {:.3} seconds in total.",
        stats.written,
        stats.skipped_unsupported + stats.skipped_transcode + stats.write_failures,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
