//! Export configuration.

use std::time::Duration;

use crate::store::ReplacePolicy;

/// Multiplier applied to the display scale to pick the deepest exported level.
pub const DEFAULT_DENSIFICATION_FACTOR: f64 = 0.1;

/// Time limit for fetching export parameters.
pub const DEFAULT_PARAMETERS_TIMEOUT: Duration = Duration::from_secs(60);

/// Time limit for the export job.
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Configuration for the export coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Scale multiplier; `0.1` exports tiles ten times more detailed than the
    /// view is showing.
    pub densification_factor: f64,
    pub parameters_timeout: Duration,
    pub export_timeout: Duration,
    /// How the new export replaces the existing cache.
    pub replace_policy: ReplacePolicy,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            densification_factor: DEFAULT_DENSIFICATION_FACTOR,
            parameters_timeout: DEFAULT_PARAMETERS_TIMEOUT,
            export_timeout: DEFAULT_EXPORT_TIMEOUT,
            replace_policy: ReplacePolicy::default(),
        }
    }
}

impl ExportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_densification_factor(mut self, factor: f64) -> Self {
        self.densification_factor = factor;
        self
    }

    pub fn with_parameters_timeout(mut self, timeout: Duration) -> Self {
        self.parameters_timeout = timeout;
        self
    }

    pub fn with_export_timeout(mut self, timeout: Duration) -> Self {
        self.export_timeout = timeout;
        self
    }

    pub fn with_replace_policy(mut self, policy: ReplacePolicy) -> Self {
        self.replace_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.densification_factor, 0.1);
        assert_eq!(config.parameters_timeout, Duration::from_secs(60));
        assert_eq!(config.export_timeout, Duration::from_secs(1800));
        assert_eq!(config.replace_policy, ReplacePolicy::Staged);
    }

    #[test]
    fn test_builder() {
        let config = ExportConfig::new()
            .with_densification_factor(0.5)
            .with_parameters_timeout(Duration::from_secs(5))
            .with_export_timeout(Duration::from_secs(10))
            .with_replace_policy(ReplacePolicy::ClearFirst);

        assert_eq!(config.densification_factor, 0.5);
        assert_eq!(config.parameters_timeout, Duration::from_secs(5));
        assert_eq!(config.export_timeout, Duration::from_secs(10));
        assert_eq!(config.replace_policy, ReplacePolicy::ClearFirst);
    }
}
