// NOTE constants in this file are interpreted by the alerting engine and
// by notification routing. They must not change once rules are migrated.

use std::collections::BTreeMap;

// Rule labels.
pub const ALERT_NAME: &str = "alertname";
pub const RULE_UID: &str = "rule_uid";
/// Marks a rule as migrated, to be routed through its legacy channels.
pub const USE_LEGACY_CHANNELS: &str = "__legacy_use_channels__";
/// Prefix of the per-channel routing labels. See `contact_label()`.
pub const CONTACT_PREFIX: &str = "__legacy_c_";
pub const CONTACT_SUFFIX: &str = "__";
pub const TRUE: &str = "true";

// Rule annotations.
pub const DASHBOARD_UID: &str = "__dashboardUid__";
pub const PANEL_ID: &str = "__panelId__";
pub const ALERT_ID: &str = "__alertId__";
pub const MESSAGE: &str = "message";

mod rule;
pub use rule::{build_annotations, build_labels, silence_matching_label};

/// LabelSet is an ordered mapping of label names to values.
pub type LabelSet = BTreeMap<String, String>;

/// Name of the label which routes a migrated rule to the legacy channel `name`.
pub fn contact_label(name: &str) -> String {
    format!("{CONTACT_PREFIX}{name}{CONTACT_SUFFIX}")
}

/// Update a LabelSet, replacing any current value of `name` with `value`.
pub fn set_value(set: &mut LabelSet, name: &str, value: &str) {
    set.insert(name.to_string(), value.to_string());
}

/// Names of the legacy channels which a LabelSet routes to, in label order.
pub fn contacts(set: &LabelSet) -> impl Iterator<Item = &str> {
    set.range(CONTACT_PREFIX.to_string()..)
        .map(|(name, _)| name.as_str())
        .take_while(|name| name.starts_with(CONTACT_PREFIX))
        .filter_map(|name| {
            name.strip_prefix(CONTACT_PREFIX)
                .and_then(|n| n.strip_suffix(CONTACT_SUFFIX))
        })
}
