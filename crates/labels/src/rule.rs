use crate::{set_value, LabelSet};
use models::{AlertNotification, DashAlertSettings};

/// Build the labels of a migrated rule from the tags of its legacy alert
/// and the legacy channels it notified.
///
/// Legacy routing is preserved by a label per channel, plus a marker
/// which routes the rule through the migrated legacy channels.
pub fn build_labels(settings: &DashAlertSettings, channels: &[AlertNotification]) -> LabelSet {
    let mut set = LabelSet::new();

    for (name, value) in settings.tags() {
        set_value(&mut set, name, &value);
    }
    set_value(&mut set, crate::USE_LEGACY_CHANNELS, crate::TRUE);

    for channel in channels {
        set_value(&mut set, &crate::contact_label(&channel.name), crate::TRUE);
    }
    set
}

/// Build the annotations of a migrated rule.
/// Every annotation is present, even when its value is empty.
pub fn build_annotations(
    dashboard_uid: &str,
    panel_id: i64,
    alert_id: i64,
    message: &str,
) -> LabelSet {
    let mut set = LabelSet::new();

    set_value(&mut set, crate::DASHBOARD_UID, dashboard_uid);
    set_value(&mut set, crate::PANEL_ID, &panel_id.to_string());
    set_value(&mut set, crate::ALERT_ID, &alert_id.to_string());
    set_value(&mut set, crate::MESSAGE, message);
    set
}

/// The label by which silences target alerts of exactly one rule.
pub fn silence_matching_label(rule_uid: &str) -> (&'static str, String) {
    (crate::RULE_UID, rule_uid.to_string())
}
