//! `[run]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [run]
//! concurrency = 32    # Max in-flight jobs per phase (0 = unbounded)
//! timeout = 0         # Seconds a single codec call may take (0 = no limit)
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub concurrency: usize,
    pub timeout: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: 32,
            timeout: 0,
        }
    }
}

impl RunConfig {
    /// Codec deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::time::Duration;

    #[test]
    fn test_run_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.run.concurrency, 32);
        assert_eq!(config.run.deadline(), None);
    }

    #[test]
    fn test_run_timeout() {
        let config = test_parse_config("[run]\nconcurrency = 0\ntimeout = 15");
        assert_eq!(config.run.concurrency, 0);
        assert_eq!(config.run.deadline(), Some(Duration::from_secs(15)));
    }
}
