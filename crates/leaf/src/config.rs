//! Configuration settings for the leaf reconciler.
//!
//! Configuration can be loaded from environment variables or constructed
//! programmatically.

use std::env;

/// Runtime configuration for a [`Root`](crate::Root).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafConfig {
    /// Warn when a component calls a different number of hooks than on its previous build
    pub hook_checks: bool,
    /// Log a JSON summary of every pass at info level
    pub pass_summary: bool,
    /// Bound on follow-up passes chained by one `request_render` call (0 = unbounded)
    pub max_chained_passes: u32,
}

impl LeafConfig {
    /// Construct a new `LeafConfig` with explicit values.
    #[inline]
    #[must_use]
    pub const fn new(hook_checks: bool, pass_summary: bool, max_chained_passes: u32) -> Self {
        Self {
            hook_checks,
            pass_summary,
            max_chained_passes,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `LEAF_HOOK_CHECKS`: "1" enables, "0" disables hook-count checks (default: on in debug builds)
    /// - `LEAF_PASS_SUMMARY`: Set to "1" to log pass summaries (default: disabled)
    /// - `LEAF_MAX_CHAINED_PASSES`: Bound on chained follow-up passes (default: 0, unbounded)
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let hook_checks = match env::var("LEAF_HOOK_CHECKS").ok().as_deref() {
            Some("1") => true,
            Some("0") => false,
            _ => defaults.hook_checks,
        };
        let pass_summary = env::var("LEAF_PASS_SUMMARY").ok().as_deref() == Some("1");
        let max_chained_passes = env::var("LEAF_MAX_CHAINED_PASSES")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(defaults.max_chained_passes);
        Self {
            hook_checks,
            pass_summary,
            max_chained_passes,
        }
    }

    /// The chained-pass bound, if one is configured.
    #[inline]
    #[must_use]
    pub const fn chained_pass_limit(&self) -> Option<u32> {
        if self.max_chained_passes == 0 {
            None
        } else {
            Some(self.max_chained_passes)
        }
    }
}

impl Default for LeafConfig {
    fn default() -> Self {
        Self::new(cfg!(debug_assertions), false, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_means_unbounded() {
        assert_eq!(LeafConfig::new(true, false, 0).chained_pass_limit(), None);
        assert_eq!(LeafConfig::new(true, false, 3).chained_pass_limit(), Some(3));
    }
}
