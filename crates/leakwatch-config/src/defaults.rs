use std::time::Duration;

/// Well-known location of the PID marker.
pub const DEFAULT_PID_PATH: &str = "/tmp/water-sensor.pid";

/// Rotating log file written by both binaries.
pub const DEFAULT_LOG_FILE: &str = "/var/log/water-sensor.log";

/// Size at which the log file is rotated (60 KiB).
pub const DEFAULT_LOG_MAX_BYTES: u64 = 60 * 1024;

/// Number of rotated log files kept next to the active one.
pub const DEFAULT_LOG_BACKUPS: usize = 5;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "debug";

/// BCM number of the pin wired to the leak sensor.
pub const DEFAULT_GPIO_PIN: u8 = 4;

/// Minimum interval between two outbound alerts.
pub const DEFAULT_HYSTERESIS: Duration = Duration::from_secs(6 * 60 * 60);

/// Interval between interrupt signals while stopping the daemon.
pub const DEFAULT_STOP_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on a single alert delivery request.
pub const DEFAULT_ALERT_TIMEOUT: Duration = Duration::from_secs(10);
