/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Configuration for ndview.
//!
//! The only setting today is the [`CheckMode`], which decides whether
//! public operations validate span bounds and coordinates before
//! touching storage. Configuration is loaded from the environment
//! once, can be merged with explicit settings, and can be overridden
//! temporarily in tests through [`global::lock`].

use std::env;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Environment variable selecting the check mode (`strict` or `fast`).
pub const CHECK_MODE_ENV: &str = "NDVIEW_CHECK_MODE";

/// How much validation public operations perform.
///
/// In `Strict` mode every span bound, scalar index and coordinate is
/// validated and violations surface as errors. In `Fast` mode those
/// logical checks are skipped and the caller guarantees validity.
/// Every view is still checked against the extent of its storage
/// when it is built, so an invalid request in fast mode yields an
/// unspecified element or an
/// [`ArrayError::OffsetOutOfStorage`](crate::ArrayError::OffsetOutOfStorage)
/// error, and never reads outside the buffer. Only the `unsafe`
/// `*_unchecked` accessors skip every check.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CheckMode {
    /// Validate everything; report violations as errors.
    Strict,
    /// Skip logical validation.
    Fast,
}

impl CheckMode {
    /// Whether logical validation is enabled.
    pub fn is_strict(self) -> bool {
        matches!(self, CheckMode::Strict)
    }
}

impl Default for CheckMode {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            CheckMode::Strict
        } else {
            CheckMode::Fast
        }
    }
}

/// Error returned when parsing an unknown check mode.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("unknown check mode {0:?}, expected \"strict\" or \"fast\"")]
pub struct ParseCheckModeError(String);

impl FromStr for CheckMode {
    type Err = ParseCheckModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" | "checked" => Ok(CheckMode::Strict),
            "fast" | "unchecked" => Ok(CheckMode::Fast),
            _ => Err(ParseCheckModeError(s.to_string())),
        }
    }
}

/// A sparse set of settings. Unset values fall back to their
/// defaults when read.
#[derive(Serialize, Deserialize, Clone, Default, Eq, PartialEq, Debug)]
pub struct Config {
    check_mode: Option<CheckMode>,
}

impl Config {
    /// An empty configuration; every setting reads as its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// The effective check mode.
    pub fn check_mode(&self) -> CheckMode {
        self.check_mode.unwrap_or_default()
    }

    /// Explicitly set the check mode.
    pub fn set_check_mode(&mut self, mode: CheckMode) {
        self.check_mode = Some(mode);
    }

    /// Whether no setting has been explicitly set.
    pub fn is_empty(&self) -> bool {
        self.check_mode.is_none()
    }
}

/// Load configuration from environment variables.
pub fn from_env() -> Config {
    from_lookup(|key| env::var(key).ok())
}

pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Config {
    let mut config = Config::new();

    if let Some(val) = lookup(CHECK_MODE_ENV) {
        match val.parse::<CheckMode>() {
            Ok(mode) => config.set_check_mode(mode),
            Err(err) => tracing::warn!("ignoring {}: {}", CHECK_MODE_ENV, err),
        }
    }

    config
}

/// Merge with another configuration, with the other taking precedence.
pub fn merge(config: &mut Config, other: &Config) {
    if let Some(mode) = other.check_mode {
        config.check_mode = Some(mode);
    }
}

/// Global configuration functions
pub mod global {
    use std::sync::LazyLock;
    use std::sync::Mutex;
    use std::sync::MutexGuard;
    use std::sync::PoisonError;
    use std::sync::RwLock;

    use super::*;

    /// Global configuration instance, initialized from environment variables.
    static CONFIG: LazyLock<RwLock<Config>> = LazyLock::new(|| {
        let config = from_env();
        tracing::debug!("loaded ndview configuration: {:?}", config);
        RwLock::new(config)
    });

    /// Serializes users of [`lock`].
    static LOCK: Mutex<()> = Mutex::new(());

    /// A snapshot of the global configuration.
    pub fn get() -> Config {
        CONFIG
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The effective global check mode. Public operations read this
    /// once and pass it down.
    pub fn check_mode() -> CheckMode {
        CONFIG
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .check_mode()
    }

    /// Merge `config` into the global configuration.
    pub fn set(config: &Config) {
        let mut global = CONFIG.write().unwrap_or_else(PoisonError::into_inner);
        merge(&mut global, config);
    }

    /// Reset the global configuration to defaults (for testing only)
    pub fn reset_to_defaults() {
        let mut config = CONFIG.write().unwrap_or_else(PoisonError::into_inner);
        *config = Config::new();
    }

    /// Acquire the global configuration lock for testing. Overrides
    /// made through the returned lock are visible process-wide, so
    /// every test that depends on a particular mode should hold it.
    pub fn lock() -> ConfigLock {
        ConfigLock {
            _guard: LOCK.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Exclusive access to the global configuration.
    pub struct ConfigLock {
        _guard: MutexGuard<'static, ()>,
    }

    impl ConfigLock {
        /// Override the check mode until the returned guard is dropped.
        pub fn override_check_mode(&self, mode: CheckMode) -> ConfigOverride<'_> {
            let mut config = CONFIG.write().unwrap_or_else(PoisonError::into_inner);
            let previous = config.clone();
            config.set_check_mode(mode);
            ConfigOverride {
                _lock: self,
                previous: Some(previous),
            }
        }
    }

    /// Restores the previous configuration on drop.
    pub struct ConfigOverride<'a> {
        _lock: &'a ConfigLock,
        previous: Option<Config>,
    }

    impl Drop for ConfigOverride<'_> {
        fn drop(&mut self) {
            if let Some(previous) = self.previous.take() {
                *CONFIG.write().unwrap_or_else(PoisonError::into_inner) = previous;
            }
        }
    }
}
