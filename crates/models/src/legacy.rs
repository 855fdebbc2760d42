use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// LegacyAlert is a dashboard-bound alert definition of the legacy alerting engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAlert {
    pub id: i64,
    pub org_id: i64,
    pub dashboard_id: i64,
    pub panel_id: i64,
    pub name: String,
    /// Free-text message, which may reference `${variable}` template values.
    #[serde(default)]
    pub message: String,
    /// Legacy evaluation state. Only "paused" is meaningful to migration.
    #[serde(default)]
    pub state: String,
    /// Evaluation frequency, in seconds.
    pub frequency: i64,
    /// Duration for which the condition must hold before the alert fires.
    #[serde(default, rename = "for", with = "humantime_serde")]
    pub for_duration: std::time::Duration,
    /// Opaque settings document of the alert, parsed as DashAlertSettings.
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// DashAlertSettings are the portions of a legacy alert's settings document
/// which are understood by migration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashAlertSettings {
    /// Legacy classic conditions. These are interpreted only by the condition translator.
    #[serde(default)]
    pub conditions: Vec<serde_json::Value>,
    #[serde(default)]
    pub notifications: Vec<NotificationKey>,
    #[serde(default)]
    pub no_data_state: String,
    #[serde(default)]
    pub execution_error_state: String,
    #[serde(default)]
    pub alert_rule_tags: BTreeMap<String, serde_json::Value>,
}

impl DashAlertSettings {
    /// Tags of the alert as label name / value pairs.
    /// String tag values are used verbatim, and other values as their JSON encoding.
    pub fn tags(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.alert_rule_tags.iter().map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.as_str(), value)
        })
    }
}

/// NotificationKey references a legacy notification channel by either ID or UID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationKey {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
}

fn is_zero(id: &i64) -> bool {
    *id == 0
}

/// AlertNotification is a legacy notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertNotification {
    pub id: i64,
    #[serde(default)]
    pub uid: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub channel_type: String,
}

/// DashboardUpgradeInfo describes where a migrated alert is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardUpgradeInfo {
    pub dashboard_uid: String,
    pub dashboard_name: String,
    pub new_folder_uid: String,
}

/// NoDataOption is the legacy behavior of an alert whose query returns no series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoDataOption {
    NoData,
    Alerting,
    Ok,
    KeepState,
}

impl NoDataOption {
    /// Parse a stored legacy option. The empty string is the legacy default of "no_data".
    /// Stored settings are free text, so unknown values yield None.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" | "no_data" => Some(Self::NoData),
            "alerting" => Some(Self::Alerting),
            "ok" => Some(Self::Ok),
            "keep_state" => Some(Self::KeepState),
            _ => None,
        }
    }
}

/// ExecutionErrorOption is the legacy behavior of an alert whose evaluation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionErrorOption {
    Alerting,
    KeepState,
    Ok,
}

impl ExecutionErrorOption {
    /// Parse a stored legacy option. The empty string is the legacy default of "alerting".
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" | "alerting" => Some(Self::Alerting),
            "keep_state" => Some(Self::KeepState),
            "ok" => Some(Self::Ok),
            _ => None,
        }
    }
}
