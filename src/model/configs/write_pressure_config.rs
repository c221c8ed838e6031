use crate::common::*;

use crate::enums::missing_data_mode::*;

fn default_threshold() -> u32 {
    700
}

fn default_consecutive_intervals() -> usize {
    3
}

#[doc = "checkForWritePressure 잡 파라미터"]
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct WritePressureParams {
    #[serde(rename = "excludeClusters", default)]
    pub exclude_clusters: Vec<String>,
    #[serde(rename = "thresholdValue", default = "default_threshold")]
    pub threshold_value: u32,
    #[serde(
        rename = "noOfConsecutiveIntervals",
        default = "default_consecutive_intervals"
    )]
    pub no_of_consecutive_intervals: usize,
    #[serde(rename = "considerMissingDataPoint", default)]
    pub consider_missing_data_point: MissingDataMode,
}

impl Default for WritePressureParams {
    fn default() -> Self {
        WritePressureParams {
            exclude_clusters: Vec::new(),
            threshold_value: default_threshold(),
            no_of_consecutive_intervals: default_consecutive_intervals(),
            consider_missing_data_point: MissingDataMode::default(),
        }
    }
}
