use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Config of a migration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Base granularity of the rule scheduler, in seconds.
    /// Rule intervals are rounded down to a multiple of it.
    pub base_interval_seconds: i64,
    /// Maximum length of a rule title, in bytes.
    pub max_title_length: usize,
    /// Maximum length of a rule group name, in bytes.
    pub max_rule_group_name_length: usize,
    /// Whether rule titles must be unique within a folder regardless of case.
    pub case_insensitive_titles: bool,
    /// Lifetime of the silences created for legacy "keep last state" options.
    #[serde(with = "humantime_serde")]
    pub silence_duration: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_interval_seconds: 10,
            max_title_length: 190,
            max_rule_group_name_length: 190,
            case_insensitive_titles: true,
            // One year, as humantime reckons it (365.25 days).
            silence_duration: Duration::from_secs(31_557_600),
        }
    }
}

impl Config {
    /// Load a Config from a YAML (or JSON) file.
    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content = std::fs::read(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_slice(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_interval_seconds <= 0 {
            anyhow::bail!(
                "baseIntervalSeconds must be positive (got {})",
                self.base_interval_seconds
            );
        }
        if self.max_title_length == 0 {
            anyhow::bail!("maxTitleLength must be positive");
        }
        // Group names keep their interval suffix, so the maximum must fit any suffix.
        if self.max_rule_group_name_length < crate::naming::MAX_INTERVAL_SUFFIX_LEN {
            anyhow::bail!(
                "maxRuleGroupNameLength must be at least {} (got {})",
                crate::naming::MAX_INTERVAL_SUFFIX_LEN,
                self.max_rule_group_name_length
            );
        }
        Ok(())
    }
}
