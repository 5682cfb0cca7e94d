//! Human-readable formatting for provisioning stats and playback time

use std::fmt;

/// Throughput bucket, used by the UI to pick a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThroughputTier {
    Fast,
    Moderate,
    Slow,
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThroughputDisplay {
    pub value: String,
    pub unit: &'static str,
    pub tier: ThroughputTier,
}

impl fmt::Display for ThroughputDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Format a throughput given in MB/s.
///
/// ```
/// use streamtorrent_domain::display::format_throughput;
///
/// assert_eq!(format_throughput(2.5).to_string(), "2.50 MB/s");
/// assert_eq!(format_throughput(0.5).to_string(), "512 KB/s");
/// assert_eq!(format_throughput(0.0).to_string(), "0 KB/s");
/// ```
pub fn format_throughput(mbps: f64) -> ThroughputDisplay {
    if mbps >= 1.0 {
        ThroughputDisplay {
            value: format!("{mbps:.2}"),
            unit: "MB/s",
            tier: ThroughputTier::Fast,
        }
    } else if mbps >= 0.1 {
        ThroughputDisplay {
            value: format!("{:.0}", mbps * 1024.0),
            unit: "KB/s",
            tier: ThroughputTier::Moderate,
        }
    } else if mbps > 0.0 {
        ThroughputDisplay {
            value: format!("{:.0}", mbps * 1024.0),
            unit: "KB/s",
            tier: ThroughputTier::Slow,
        }
    } else {
        ThroughputDisplay {
            value: "0".to_string(),
            unit: "KB/s",
            tier: ThroughputTier::Idle,
        }
    }
}

/// Format a size given in MB.
pub fn format_size(mb: f64) -> String {
    if mb >= 1024.0 {
        format!("{:.2} GB", mb / 1024.0)
    } else {
        format!("{:.1} MB", mb.max(0.0))
    }
}

/// Format seconds as `h:mm:ss` or `m:ss`; unknown or non-positive input is `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
