mod common;

use assert_cmd::Command;
use prost::Message;
use std::path::Path;

use bag2record::mappings::tf::TransformStampeds;
use bag2record::record::read_record;
use bag2record::{convert_bag, ChannelRegistry, ConvertError, ConvertOptions};
use common::{framed_pb, tf_message, BagBuilder};

fn quiet_options(bag: &Path) -> ConvertOptions {
    ConvertOptions {
        show_progress: false,
        ..ConvertOptions::for_bag(bag.to_str().unwrap())
    }
}

fn channel_names(path: &str) -> Vec<String> {
    read_record(path)
        .unwrap()
        .channels
        .into_iter()
        .filter_map(|c| c.name)
        .collect()
}

#[test]
fn test_cli_converts_recognized_channel_only() {
    let dir = tempfile::tempdir().unwrap();
    let bag = dir.path().join("drive.bag");
    let mut builder = BagBuilder::new();
    let planning = builder.connection("/apollo/planning", "pb_msgs/ADCTrajectory");
    let camera = builder.connection("/camera/image_raw", "sensor_msgs/Image");
    builder
        .message(planning, 10, &framed_pb(&[0x08, 0x01]))
        .message(camera, 15, b"pixels")
        .message(planning, 20, &framed_pb(&[0x08, 0x02]))
        .message(camera, 25, b"pixels")
        .message(planning, 30, &framed_pb(&[0x08, 0x03]));
    builder.write(&bag);

    let mut cmd = Command::cargo_bin("bag2record").unwrap();
    cmd.arg(&bag).assert().success();

    let record = dir.path().join("drive.record");
    let contents = read_record(&record).unwrap();
    assert_eq!(contents.header.is_complete, Some(true));
    assert_eq!(contents.channels.len(), 1);
    assert_eq!(contents.channels[0].name.as_deref(), Some("/apollo/planning"));
    assert_eq!(
        contents.channels[0].message_type.as_deref(),
        Some("apollo.planning.ADCTrajectory")
    );

    let written: Vec<(u64, Vec<u8>)> = contents
        .messages
        .iter()
        .map(|m| (m.time.unwrap(), m.content.clone().unwrap()))
        .collect();
    assert_eq!(
        written,
        vec![(10, vec![0x08, 0x01]), (20, vec![0x08, 0x02]), (30, vec![0x08, 0x03])]
    );
    assert!(contents
        .messages
        .iter()
        .all(|m| m.channel_name.as_deref() == Some("/apollo/planning")));
}

#[test]
fn test_transforms_aggregated() {
    let dir = tempfile::tempdir().unwrap();
    let bag = dir.path().join("tf.bag");
    let mut builder = BagBuilder::new();
    let tf = builder.connection("/tf", "tf2_msgs/TFMessage");
    let tf_static = builder.connection("/tf_static", "tf2_msgs/TFMessage");
    builder
        .message(tf_static, 1_000, &tf_message(&[]))
        .message(
            tf,
            2_000,
            &tf_message(&[
                ("world", "base_link", [1.0, 2.0, 3.0], [0.0, 0.0, 0.7071, 0.7071]),
                ("base_link", "velodyne", [0.0, 0.0, 1.8], [0.0, 0.0, 0.0, 3.0]),
            ]),
        );
    builder.write(&bag);

    let options = quiet_options(&bag);
    let stats = convert_bag(&options, &ChannelRegistry::apollo()).unwrap();
    assert_eq!(stats.written, 2);

    let contents = read_record(&options.output_path).unwrap();
    assert_eq!(channel_names(&options.output_path), vec!["/tf_static", "/tf"]);
    assert!(contents
        .channels
        .iter()
        .all(|c| c.message_type.as_deref() == Some("adu.common.TransformStampeds")));

    let decode = |i: usize| {
        TransformStampeds::decode(contents.messages[i].content.as_deref().unwrap()).unwrap()
    };
    let statics = decode(0);
    assert!(statics.transforms.is_empty());

    let dynamic = decode(1);
    assert_eq!(dynamic.transforms.len(), 2);
    let velodyne = &dynamic.transforms[1];
    assert_eq!(velodyne.child_frame_id.as_deref(), Some("velodyne"));
    assert_eq!(velodyne.header.as_ref().unwrap().frame_id.as_deref(), Some("base_link"));
    assert_eq!(velodyne.header.as_ref().unwrap().sequence_num, Some(1));
    let rotation = velodyne.transform.as_ref().unwrap().rotation.as_ref().unwrap();
    assert_eq!(rotation.qw, Some(3.0));
}

#[test]
fn test_messages_written_in_timestamp_order() {
    let dir = tempfile::tempdir().unwrap();
    let bag = dir.path().join("unordered.bag");
    let mut builder = BagBuilder::new();
    let chassis = builder.connection("/apollo/canbus/chassis", "pb_msgs/Chassis");
    let pose = builder.connection("/apollo/localization/pose", "pb_msgs/LocalizationEstimate");
    builder
        .message(chassis, 300, &framed_pb(&[3]))
        .message(pose, 100, &framed_pb(&[1]))
        .message(chassis, 200, &framed_pb(&[2]))
        .message(pose, 400, &framed_pb(&[4]));
    builder.write(&bag);

    let options = quiet_options(&bag);
    convert_bag(&options, &ChannelRegistry::apollo()).unwrap();

    let contents = read_record(&options.output_path).unwrap();
    let times: Vec<u64> = contents.messages.iter().filter_map(|m| m.time).collect();
    assert_eq!(times, vec![100, 200, 300, 400]);
    assert_eq!(
        channel_names(&options.output_path),
        vec!["/apollo/localization/pose", "/apollo/canbus/chassis"]
    );
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let bag = dir.path().join("again.bag");
    let mut builder = BagBuilder::new();
    let planning = builder.connection("/apollo/planning", "pb_msgs/ADCTrajectory");
    let tf = builder.connection("/tf", "tf2_msgs/TFMessage");
    builder
        .message(planning, 1_500_000_000, &framed_pb(&[0x08, 0x07]))
        .message(
            tf,
            1_600_000_000,
            &tf_message(&[("map", "odom", [0.5; 3], [0.0, 0.0, 0.0, 1.0])]),
        );
    builder.write(&bag);

    let options = quiet_options(&bag);
    let registry = ChannelRegistry::apollo();
    convert_bag(&options, &registry).unwrap();
    let first = std::fs::read(&options.output_path).unwrap();
    convert_bag(&options, &registry).unwrap();
    let second = std::fs::read(&options.output_path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_missing_bag_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let bag = dir.path().join("nope.bag");

    let mut cmd = Command::cargo_bin("bag2record").unwrap();
    cmd.arg(&bag).assert().failure();

    assert!(!dir.path().join("nope.record").exists());
}

fn planning_bag(path: &Path) {
    let mut builder = BagBuilder::new();
    let planning = builder.connection("/apollo/planning", "pb_msgs/ADCTrajectory");
    builder.message(planning, 10, &framed_pb(&[0x08, 0x01]));
    builder.write(path);
}

#[test]
fn test_unwritable_destination_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let bag = dir.path().join("blocked.bag");
    planning_bag(&bag);
    // a directory where the record file should go
    std::fs::create_dir(dir.path().join("blocked.record")).unwrap();

    let err = convert_bag(&quiet_options(&bag), &ChannelRegistry::apollo()).unwrap_err();

    assert!(matches!(err, ConvertError::DestinationOpen { .. }));
    assert!(dir.path().join("blocked.record").is_dir());
}

#[test]
fn test_cli_unwritable_destination_fails() {
    let dir = tempfile::tempdir().unwrap();
    let bag = dir.path().join("blocked.bag");
    planning_bag(&bag);
    std::fs::create_dir(dir.path().join("blocked.record")).unwrap();

    let mut cmd = Command::cargo_bin("bag2record").unwrap();
    cmd.arg(&bag).assert().failure();
}
