use std::time::Duration;

/// Maximum time a control call waits to acquire the latency list lock.
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 8080;
