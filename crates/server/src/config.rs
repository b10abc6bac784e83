//! Process configuration (§6, §10.3) — environment-variable-driven, typed
//! defaults, built once at startup. Tracker rotation cadence and the
//! session/rule-tracker sweep intervals are fixed per spec and live as
//! `Duration` constants rather than env vars (§6: "tracker rotation
//! cadence (1 min fixed)").

use std::time::Duration;

/// Top-of-minute rotation — fixed, not configurable.
pub const TRACKER_ROTATION_INTERVAL: Duration = Duration::from_secs(60);
/// Ended-session aggregate persistence sweep — fixed.
pub const SESSION_PERSISTENCE_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Stale rule-tracker sweep — fixed.
pub const RULE_TRACKER_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub forward_window_days: u64,
    pub cleanup_interval_hours: u64,
    pub startup_cleanup_delay_hours: u64,
    pub rule_tracker_staleness_minutes: i64,
    pub activity_threshold: f64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Reads every setting from the environment, falling back to the
    /// spec's defaults (§6) for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or_default(),
            port: env_or("WARDEN_PORT", 8080),
            forward_window_days: env_or("WARDEN_FORWARD_WINDOW_DAYS", 7),
            cleanup_interval_hours: env_or("WARDEN_CLEANUP_INTERVAL_HOURS", 6),
            startup_cleanup_delay_hours: env_or("WARDEN_STARTUP_CLEANUP_DELAY_HOURS", 1),
            rule_tracker_staleness_minutes: env_or("WARDEN_RULE_TRACKER_STALENESS_MINUTES", 30),
            activity_threshold: env_or("WARDEN_ACTIVITY_THRESHOLD", 0.8),
        }
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_hours * 3600)
    }

    pub fn startup_cleanup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_cleanup_delay_hours * 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_apply_when_env_unset() {
        for key in [
            "WARDEN_PORT",
            "WARDEN_FORWARD_WINDOW_DAYS",
            "WARDEN_CLEANUP_INTERVAL_HOURS",
            "WARDEN_STARTUP_CLEANUP_DELAY_HOURS",
            "WARDEN_RULE_TRACKER_STALENESS_MINUTES",
            "WARDEN_ACTIVITY_THRESHOLD",
        ] {
            std::env::remove_var(key);
        }
        let config = Config::from_env();
        assert_eq!(config.port, 8080);
        assert_eq!(config.forward_window_days, 7);
        assert_eq!(config.cleanup_interval_hours, 6);
        assert_eq!(config.startup_cleanup_delay_hours, 1);
        assert_eq!(config.rule_tracker_staleness_minutes, 30);
        assert_eq!(config.activity_threshold, 0.8);
    }

    #[test]
    #[serial]
    fn reads_overrides_from_env() {
        std::env::set_var("WARDEN_PORT", "9090");
        let config = Config::from_env();
        assert_eq!(config.port, 9090);
        std::env::remove_var("WARDEN_PORT");
    }
}
