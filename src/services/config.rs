//! Runtime configuration, loaded from the environment once at startup.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Advice-server base URL, e.g. `http://localhost:8080/api`.
    pub base_url: String,
    /// Window-scan cadence.
    pub scan_interval: Duration,
    /// Simulation tick. The physics integration assumes 50ms.
    pub tick: Duration,
}

impl OverlayConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("ADVISOR_BASE_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "http://localhost:8080/api".to_string());

        let scan_interval =
            Duration::from_millis(env_u64("ADVISOR_SCAN_INTERVAL_MS", 1_000).clamp(100, 60_000));
        let tick = Duration::from_millis(env_u64("ADVISOR_TICK_MS", 50).clamp(10, 1_000));

        Self {
            base_url,
            scan_interval,
            tick,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            scan_interval: Duration::from_millis(1_000),
            tick: Duration::from_millis(50),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = OverlayConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.tick, Duration::from_millis(50));
        assert_eq!(config.scan_interval, Duration::from_millis(1_000));
    }

    #[test]
    fn env_u64_ignores_garbage() {
        assert_eq!(env_u64("ADVISOR_TEST_KEY_THAT_DOES_NOT_EXIST", 42), 42);
    }
}
