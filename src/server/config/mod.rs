// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Configuration of the subscription engine, loadable from and savable to a YAML file.

use std::path::Path;

use crate::{core::config::Config, server::constants};

pub mod limits;

use self::limits::SubscriptionLimits;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Rate at which the scheduler of a session should be advanced, in milliseconds
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
    #[serde(default)]
    pub limits: SubscriptionLimits,
}

fn default_tick_rate_ms() -> u64 {
    constants::SUBSCRIPTION_TIMER_RATE_MS
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate_ms(),
            limits: SubscriptionLimits::default(),
        }
    }
}

impl Config for SubscriptionConfig {
    fn is_valid(&self) -> bool {
        let mut valid = true;
        if self.tick_rate_ms == 0 {
            error!("tick_rate_ms must be at least 1");
            valid = false;
        }
        if !self.limits.is_valid() {
            valid = false;
        }
        valid
    }
}

impl SubscriptionConfig {
    pub fn load(path: &Path) -> Result<SubscriptionConfig, ()> {
        <Self as Config>::load(path)
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn save_and_load() {
        let dir = TempDir::new("subscription_config").unwrap();
        let path = dir.path().join("subscriptions.conf");

        let mut config = SubscriptionConfig::default();
        config.tick_rate_ms = 50;
        config.limits.max_subscriptions_per_session = 3;
        config.limits.max_notifications_per_publish = 100;
        config.save(&path).unwrap();

        let loaded = SubscriptionConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn invalid_config_is_not_saved() {
        let dir = TempDir::new("subscription_config").unwrap();
        let path = dir.path().join("subscriptions.conf");

        let mut config = SubscriptionConfig::default();
        config.tick_rate_ms = 0;
        assert!(config.save(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn partial_config_uses_defaults() {
        let dir = TempDir::new("subscription_config").unwrap();
        let path = dir.path().join("subscriptions.conf");
        std::fs::write(&path, "limits:\n  max_pending_publish_requests: 5\n").unwrap();

        let loaded = SubscriptionConfig::load(&path).unwrap();
        assert_eq!(loaded.tick_rate_ms, constants::SUBSCRIPTION_TIMER_RATE_MS);
        assert_eq!(loaded.limits.max_pending_publish_requests, 5);
        assert_eq!(
            loaded.limits.max_keep_alive_count,
            constants::MAX_KEEP_ALIVE_COUNT
        );
    }

    #[test]
    fn out_of_range_limits_are_rejected() {
        let dir = TempDir::new("subscription_config").unwrap();
        let path = dir.path().join("subscriptions.conf");
        std::fs::write(
            &path,
            "limits:\n  max_keep_alive_count: 2000000000\n  max_lifetime_count: 3000000000\n",
        )
        .unwrap();
        assert!(SubscriptionConfig::load(&path).is_err());

        std::fs::write(&path, "limits:\n  max_retransmission_queue_size: 0\n").unwrap();
        assert!(SubscriptionConfig::load(&path).is_err());
    }

    #[test]
    fn missing_file() {
        assert!(SubscriptionConfig::load(Path::new("/does/not/exist.conf")).is_err());
    }
}
