//! Player configuration
//!
//! Defaults match the provisioning backend's expected cadence. Every value
//! can be overridden through `STREAMTORRENT_*` environment variables; the
//! binary loads a `.env` file first.

use std::str::FromStr;
use std::time::Duration;

use streamtorrent_domain::EngineConfiguration;

/// Default provisioning API location.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

pub const ENV_API_URL: &str = "STREAMTORRENT_API_URL";
pub const ENV_POLL_INTERVAL_MS: &str = "STREAMTORRENT_POLL_INTERVAL_MS";
pub const ENV_POLL_BACKOFF_MS: &str = "STREAMTORRENT_POLL_BACKOFF_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "STREAMTORRENT_REQUEST_TIMEOUT_MS";
pub const ENV_POLL_AFTER_READY: &str = "STREAMTORRENT_POLL_AFTER_READY";
pub const ENV_AUTOPLAY: &str = "STREAMTORRENT_AUTOPLAY";
pub const ENV_AUTOPLAY_DELAY_MS: &str = "STREAMTORRENT_AUTOPLAY_DELAY_MS";
pub const ENV_START_MUTED: &str = "STREAMTORRENT_START_MUTED";

/// Provisioning poll cadence
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Delay between polls after a successful fetch
    pub interval: Duration,
    /// Delay after a failed fetch
    pub transport_backoff: Duration,
    /// Upper bound for a single status request
    pub request_timeout: Duration,
    /// Keep polling after `ready` to report peer and throughput stats
    pub continue_after_ready: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            transport_backoff: Duration::from_millis(3000),
            request_timeout: Duration::from_secs(10),
            continue_after_ready: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    pub autoplay: bool,
    /// Pause between a successful load and the autoplay attempt
    pub autoplay_delay: Duration,
    /// Muted playback is exempt from most autoplay policies
    pub start_muted: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            autoplay_delay: Duration::from_millis(200),
            start_muted: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub api_base_url: String,
    pub poll: PollConfig,
    pub playback: PlaybackConfig,
    pub engine: EngineConfiguration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll: PollConfig::default(),
            playback: PlaybackConfig::default(),
            engine: EngineConfiguration::default(),
        }
    }
}

impl PlayerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| {
            Duration::from_millis(parse_or(&lookup, key, default.as_millis() as u64))
        };
        // zero would turn the poll loop into a busy loop
        let nonzero_millis = |key: &str, default: Duration| {
            let value = millis(key, default);
            if value.is_zero() {
                tracing::warn!(key, ?default, "Ignoring zero duration");
                return default;
            }
            value
        };

        Self {
            api_base_url: lookup(ENV_API_URL)
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.api_base_url),
            poll: PollConfig {
                interval: nonzero_millis(ENV_POLL_INTERVAL_MS, defaults.poll.interval),
                transport_backoff: nonzero_millis(
                    ENV_POLL_BACKOFF_MS,
                    defaults.poll.transport_backoff,
                ),
                request_timeout: nonzero_millis(
                    ENV_REQUEST_TIMEOUT_MS,
                    defaults.poll.request_timeout,
                ),
                continue_after_ready: parse_or(
                    &lookup,
                    ENV_POLL_AFTER_READY,
                    defaults.poll.continue_after_ready,
                ),
            },
            playback: PlaybackConfig {
                autoplay: parse_or(&lookup, ENV_AUTOPLAY, defaults.playback.autoplay),
                autoplay_delay: millis(ENV_AUTOPLAY_DELAY_MS, defaults.playback.autoplay_delay),
                start_muted: parse_or(&lookup, ENV_START_MUTED, defaults.playback.start_muted),
            },
            engine: defaults.engine,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, ?default, "Ignoring unparsable config value");
                default
            }
        },
    }
}
