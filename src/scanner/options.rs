use std::time::SystemTime;

use crate::config::ScanConfig;

/// Configuration options for a junk scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Deepest level (root = 0) at which candidates are reported. Sizes are
    /// always computed over the full subtree.
    pub max_depth: Option<usize>,

    /// Stay on the same filesystem (don't cross mount points)
    pub one_file_system: bool,

    /// Clock value used for age conditions
    pub now: SystemTime,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            one_file_system: false,
            now: SystemTime::now(),
        }
    }
}

impl ScanOptions {
    /// Create a new ScanOptions with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new()
            .with_max_depth(config.max_depth)
            .with_one_file_system(config.one_file_system)
    }

    /// Set maximum candidate depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set whether to stay on the same filesystem
    pub fn with_one_file_system(mut self, enabled: bool) -> Self {
        self.one_file_system = enabled;
        self
    }

    /// Pin the clock
    pub fn with_now(mut self, now: SystemTime) -> Self {
        self.now = now;
        self
    }

    pub(crate) fn within_depth(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_options() {
        let opts = ScanOptions::default();
        assert_eq!(opts.max_depth, None);
        assert!(!opts.one_file_system);
        assert!(opts.within_depth(1000));
    }

    #[test]
    fn test_scan_options_builder() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(42);
        let opts = ScanOptions::new()
            .with_max_depth(5)
            .with_one_file_system(true)
            .with_now(now);

        assert_eq!(opts.max_depth, Some(5));
        assert!(opts.one_file_system);
        assert_eq!(opts.now, now);
        assert!(opts.within_depth(5));
        assert!(!opts.within_depth(6));
    }

    #[test]
    fn test_from_config() {
        let opts = ScanOptions::from_config(&ScanConfig::default());
        assert_eq!(opts.max_depth, Some(8));
    }
}
