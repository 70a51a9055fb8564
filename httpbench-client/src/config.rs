use clap::Parser;
use httpbench_common::{BenchError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://server:8080";
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_WARMUP_SECS: u64 = 120;
pub const DEFAULT_TEST_SECS: u64 = 180;
pub const DEFAULT_RESULTS_DIR: &str = "/results";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Must exceed the request timeout so a worker stuck on its last request can still report.
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 15;
pub const DEFAULT_SETTLE_SECS: u64 = 0;
pub const DEFAULT_SETTLE_SCALE_THRESHOLD: usize = 256;
pub const DEFAULT_SETTLE_MAX_MULTIPLIER: u32 = 4;
/// Ceiling for every duration setting, settle delay included after scaling. One week.
pub const MAX_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Load generator settings. Every option can be given as a flag or through its environment variable.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "httpbench-client", about = "Sustained-load HTTP client benchmark")]
pub struct BenchConfig {
    /// Base URL of the echo server.
    #[arg(long, env = "SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Number of concurrent workers.
    #[arg(long, env = "CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Warmup phase length in seconds (not measured).
    #[arg(long = "warmup-duration", env = "WARMUP_DURATION", default_value_t = DEFAULT_WARMUP_SECS)]
    pub warmup_secs: u64,

    /// Measurement phase length in seconds.
    #[arg(long = "test-duration", env = "TEST_DURATION", default_value_t = DEFAULT_TEST_SECS)]
    pub test_secs: u64,

    /// Directory the result file is written to.
    #[arg(long, env = "RESULTS_DIR", default_value = DEFAULT_RESULTS_DIR)]
    pub results_dir: PathBuf,

    /// Per-request timeout in seconds.
    #[arg(long = "request-timeout", env = "REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// How long past the phase deadline to wait for workers to report, in seconds.
    #[arg(long = "grace-period", env = "GRACE_PERIOD", default_value_t = DEFAULT_GRACE_PERIOD_SECS)]
    pub grace_period_secs: u64,

    /// Base pause between warmup and measurement, in seconds.
    #[arg(long = "settle-delay", env = "SETTLE_DELAY", default_value_t = DEFAULT_SETTLE_SECS)]
    pub settle_secs: u64,

    /// Concurrency from which the settle delay is scaled up.
    #[arg(long, env = "SETTLE_SCALE_THRESHOLD", default_value_t = DEFAULT_SETTLE_SCALE_THRESHOLD)]
    pub settle_scale_threshold: usize,

    /// Upper bound on the settle delay multiplier.
    #[arg(long, env = "SETTLE_MAX_MULTIPLIER", default_value_t = DEFAULT_SETTLE_MAX_MULTIPLIER)]
    pub settle_max_multiplier: u32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            warmup_secs: DEFAULT_WARMUP_SECS,
            test_secs: DEFAULT_TEST_SECS,
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
            settle_secs: DEFAULT_SETTLE_SECS,
            settle_scale_threshold: DEFAULT_SETTLE_SCALE_THRESHOLD,
            settle_max_multiplier: DEFAULT_SETTLE_MAX_MULTIPLIER,
        }
    }
}

impl BenchConfig {
    /// Reject settings no run can be meaningfully measured with.
    pub fn validate(&self) -> Result<()> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(BenchError::InvalidConfig(format!(
                "SERVER_URL must start with http:// or https://, got {:?}",
                self.server_url
            )));
        }
        if self.concurrency == 0 {
            return Err(BenchError::InvalidConfig("CONCURRENCY must be at least 1".to_string()));
        }
        if self.test_secs == 0 {
            return Err(BenchError::InvalidConfig("TEST_DURATION must be at least 1 second".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(BenchError::InvalidConfig("REQUEST_TIMEOUT must be at least 1 second".to_string()));
        }
        for (name, secs) in [
            ("WARMUP_DURATION", self.warmup_secs),
            ("TEST_DURATION", self.test_secs),
            ("REQUEST_TIMEOUT", self.request_timeout_secs),
            ("GRACE_PERIOD", self.grace_period_secs),
            ("SETTLE_DELAY", self.settle_secs),
        ] {
            if secs > MAX_DURATION_SECS {
                return Err(BenchError::InvalidConfig(format!(
                    "{name} must be at most {MAX_DURATION_SECS} seconds, got {secs}"
                )));
            }
        }
        let settle = self.settle_policy().delay_for(self.concurrency);
        if settle > Duration::from_secs(MAX_DURATION_SECS) {
            return Err(BenchError::InvalidConfig(format!(
                "SETTLE_DELAY scaled for CONCURRENCY {} is {}s, more than {MAX_DURATION_SECS} seconds",
                self.concurrency,
                settle.as_secs()
            )));
        }
        Ok(())
    }

    /// Server URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }

    pub fn measurement(&self) -> Duration {
        Duration::from_secs(self.test_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    pub fn settle_policy(&self) -> SettlePolicy {
        SettlePolicy {
            base: Duration::from_secs(self.settle_secs),
            scale_threshold: self.settle_scale_threshold,
            max_multiplier: self.settle_max_multiplier,
        }
    }
}

/// Pause inserted between warmup and measurement so in-flight warmup traffic drains first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    pub base: Duration,
    pub scale_threshold: usize,
    pub max_multiplier: u32,
}

impl SettlePolicy {
    /// `base` below the threshold; `base * min(concurrency / threshold, max_multiplier)` at or above it.
    /// Saturates at `Duration::MAX`.
    pub fn delay_for(&self, concurrency: usize) -> Duration {
        if self.base.is_zero() || self.scale_threshold == 0 || concurrency < self.scale_threshold {
            return self.base;
        }
        let ratio = u32::try_from(concurrency / self.scale_threshold).unwrap_or(u32::MAX);
        self.base.saturating_mul(ratio.clamp(1, self.max_multiplier.max(1)))
    }
}
