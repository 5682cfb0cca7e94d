//! Streaming and adaptation options handed to the media engine
//!
//! These values are pass-through: the engine implements buffering, retry and
//! bitrate adaptation itself. Serialized field names match the engine's
//! configuration tree (`streaming.bufferingGoal`, `abr.switchInterval`, ...).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfiguration {
    pub streaming: StreamingConfig,
    pub abr: AbrConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingConfig {
    /// Seconds of media to buffer ahead of the playhead
    pub buffering_goal: f64,
    /// Seconds required before playback resumes after a stall
    pub rebuffering_goal: f64,
    /// Seconds of already-played media kept behind the playhead
    pub buffer_behind: f64,
    pub retry_parameters: RetryParameters,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            buffering_goal: 60.0,
            rebuffering_goal: 2.0,
            buffer_behind: 30.0,
            retry_parameters: RetryParameters::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryParameters {
    pub max_attempts: u32,
    /// Milliseconds
    pub base_delay: u64,
    pub backoff_factor: f64,
    pub fuzz_factor: f64,
}

impl Default for RetryParameters {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: 1000,
            backoff_factor: 2.0,
            fuzz_factor: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbrConfig {
    pub enabled: bool,
    /// Bits per second
    pub default_bandwidth_estimate: u64,
    /// Minimum seconds between automatic switches
    pub switch_interval: f64,
    pub bandwidth_upgrade_target: f64,
    pub bandwidth_downgrade_target: f64,
}

impl Default for AbrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_bandwidth_estimate: 1_000_000,
            switch_interval: 8.0,
            bandwidth_upgrade_target: 0.85,
            bandwidth_downgrade_target: 0.95,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_engine_option_names() {
        let json = serde_json::to_value(EngineConfiguration::default()).expect("serialize");

        assert_eq!(json["streaming"]["bufferingGoal"], 60.0);
        assert_eq!(json["streaming"]["rebufferingGoal"], 2.0);
        assert_eq!(json["streaming"]["bufferBehind"], 30.0);
        assert_eq!(json["streaming"]["retryParameters"]["maxAttempts"], 5);
        assert_eq!(json["streaming"]["retryParameters"]["baseDelay"], 1000);
        assert_eq!(json["streaming"]["retryParameters"]["backoffFactor"], 2.0);
        assert_eq!(json["streaming"]["retryParameters"]["fuzzFactor"], 0.5);
        assert_eq!(json["abr"]["enabled"], true);
        assert_eq!(json["abr"]["defaultBandwidthEstimate"], 1_000_000);
        assert_eq!(json["abr"]["switchInterval"], 8.0);
        assert_eq!(json["abr"]["bandwidthUpgradeTarget"], 0.85);
        assert_eq!(json["abr"]["bandwidthDowngradeTarget"], 0.95);
    }
}
