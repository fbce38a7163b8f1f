//! Channel registry - supported ROS channels and their Cyber RT schemas

use std::collections::BTreeMap;

use crate::mappings::TranscodeRule;
use crate::mappings::tf;

/// Destination schema and transcode rule of one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    /// Fully qualified protobuf type written to the record channel
    pub message_type: String,
    /// Serialized `ProtoDesc`; empty when the type's descriptor is not compiled in
    pub proto_desc: Vec<u8>,
    pub rule: TranscodeRule,
}

impl ChannelSpec {
    /// Registration would go out without a schema the table should carry.
    ///
    /// Plain protobuf channels never have their descriptor compiled in, so an
    /// empty `proto_desc` is only unexpected for the other rules.
    pub fn lacks_expected_schema(&self) -> bool {
        self.message_type.is_empty()
            || (self.proto_desc.is_empty() && self.rule != TranscodeRule::Protobuf)
    }
}

/// Immutable name → schema table, built once and passed to the pipeline
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: BTreeMap<String, ChannelSpec>,
}

const APOLLO_PROTOBUF_CHANNELS: &[(&str, &str)] = &[
    ("/apollo/perception/obstacles", "apollo.perception.PerceptionObstacles"),
    ("/apollo/planning", "apollo.planning.ADCTrajectory"),
    ("/apollo/prediction", "apollo.prediction.PredictionObstacles"),
    ("/apollo/canbus/chassis", "apollo.canbus.Chassis"),
    ("/apollo/control", "apollo.control.ControlCommand"),
    ("/apollo/guardian", "apollo.guardian.GuardianCommand"),
    ("/apollo/localization/pose", "apollo.localization.LocalizationEstimate"),
    ("/apollo/perception/traffic_light", "apollo.perception.TrafficLightDetection"),
    ("/apollo/drive_event", "apollo.common.DriveEvent"),
    ("/apollo/sensor/gnss/corrected_imu", "apollo.localization.CorrectedImu"),
    ("/apollo/sensor/gnss/odometry", "apollo.localization.Gps"),
    ("/apollo/monitor/system_status", "apollo.monitor.SystemStatus"),
    ("/apollo/monitor/static_info", "apollo.data.StaticInfo"),
    ("/apollo/monitor", "apollo.common.monitor.MonitorMessage"),
    ("/apollo/canbus/chassis_detail", "apollo.canbus.ChassisDetail"),
    ("/apollo/control/pad", "apollo.control.PadMessage"),
    ("/apollo/navigation", "apollo.relative_map.NavigationInfo"),
    ("/apollo/routing_request", "apollo.routing.RoutingRequest"),
    ("/apollo/routing_response", "apollo.routing.RoutingResponse"),
    ("/apollo/sensor/conti_radar", "apollo.drivers.ContiRadar"),
    ("/apollo/sensor/delphi_esr", "apollo.drivers.DelphiESR"),
    ("/apollo/sensor/gnss/best_pose", "apollo.drivers.gnss.GnssBestPose"),
    ("/apollo/sensor/gnss/gnss_status", "apollo.drivers.gnss_status.GnssStatus"),
    ("/apollo/sensor/gnss/imu", "apollo.drivers.gnss.Imu"),
    ("/apollo/sensor/gnss/ins_stat", "apollo.drivers.gnss.InsStat"),
    ("/apollo/sensor/gnss/rtk_eph", "apollo.drivers.gnss.GnssEphemeris"),
    ("/apollo/sensor/gnss/rtk_obs", "apollo.drivers.gnss.EpochObservation"),
];

const TF_CHANNELS: &[&str] = &["/tf", "/tf_static"];

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled-in Apollo channel table
    pub fn apollo() -> Self {
        let mut registry = Self::new();
        for (name, message_type) in APOLLO_PROTOBUF_CHANNELS {
            registry.insert(name, message_type, Vec::new(), TranscodeRule::Protobuf);
        }
        let tf_desc = tf::transform_stampeds_desc();
        for name in TF_CHANNELS {
            registry.insert(
                name,
                tf::TRANSFORM_STAMPEDS_TYPE,
                tf_desc.clone(),
                TranscodeRule::Transforms,
            );
        }
        registry
    }

    pub fn insert(
        &mut self,
        name: &str,
        message_type: &str,
        proto_desc: Vec<u8>,
        rule: TranscodeRule,
    ) -> &mut Self {
        self.channels.insert(
            name.to_string(),
            ChannelSpec { message_type: message_type.to_string(), proto_desc, rule },
        );
        self
    }

    /// `None` means the channel is not supported and its messages are skipped
    pub fn lookup(&self, name: &str) -> Option<&ChannelSpec> {
        self.channels.get(name)
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
