use crate::RawValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Datasource UID of server-side expression queries, which operate over
/// the results of other queries rather than querying a datasource.
pub const EXPRESSION_DATASOURCE_UID: &str = "__expr__";

/// NoDataState is the state of a rule whose queries return no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoDataState {
    Alerting,
    NoData,
    #[serde(rename = "OK")]
    Ok,
}

/// ExecutionErrorState is the state of a rule whose evaluation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionErrorState {
    #[serde(rename = "Alerting")]
    AlertingErrState,
    #[serde(rename = "Error")]
    ErrorErrState,
    #[serde(rename = "OK")]
    OkErrState,
}

impl std::fmt::Display for NoDataState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Alerting => "Alerting",
            Self::NoData => "NoData",
            Self::Ok => "OK",
        })
    }
}

impl std::fmt::Display for ExecutionErrorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::AlertingErrState => "Alerting",
            Self::ErrorErrState => "Error",
            Self::OkErrState => "OK",
        })
    }
}

/// RelativeTimeRange is the time range of a query, in seconds before evaluation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeTimeRange {
    pub from: i64,
    pub to: i64,
}

/// AlertQuery is a single query or expression node of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertQuery {
    pub ref_id: String,
    #[serde(default)]
    pub query_type: String,
    #[serde(default)]
    pub relative_time_range: RelativeTimeRange,
    pub datasource_uid: String,
    /// Datasource-specific query model, which must be a JSON object.
    pub model: RawValue,
}

impl AlertQuery {
    pub fn is_expression(&self) -> bool {
        self.datasource_uid == EXPRESSION_DATASOURCE_UID
    }
}

/// Condition is the translation of legacy alert conditions into
/// an ordered graph of queries and the reference of its condition node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub condition: String,
    pub data: Vec<AlertQuery>,
}

/// AlertRule is a rule of the unified alerting engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub org_id: i64,
    pub uid: String,
    pub title: String,
    pub condition: String,
    pub data: Vec<AlertQuery>,
    pub interval_seconds: i64,
    pub version: i64,
    pub namespace_uid: String,
    pub dashboard_uid: Option<String>,
    pub panel_id: Option<i64>,
    pub rule_group: String,
    pub rule_group_index: i32,
    #[serde(rename = "for", with = "humantime_serde")]
    pub for_duration: std::time::Duration,
    pub updated: DateTime<Utc>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub is_paused: bool,
    pub no_data_state: NoDataState,
    pub exec_err_state: ExecutionErrorState,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn state_serialization() {
        assert_eq!(
            serde_json::to_string(&[NoDataState::Ok, NoDataState::NoData, NoDataState::Alerting])
                .unwrap(),
            r#"["OK","NoData","Alerting"]"#
        );
        assert_eq!(
            serde_json::to_string(&[
                ExecutionErrorState::OkErrState,
                ExecutionErrorState::ErrorErrState,
                ExecutionErrorState::AlertingErrState,
            ])
            .unwrap(),
            r#"["OK","Error","Alerting"]"#
        );
        assert_eq!(NoDataState::Ok.to_string(), "OK");
        assert_eq!(ExecutionErrorState::ErrorErrState.to_string(), "Error");
    }

    #[test]
    fn query_parsing() {
        let query: AlertQuery = serde_json::from_str(
            r#"{
                "refId": "A",
                "datasourceUid": "P1809F7CD0C75ACF3",
                "relativeTimeRange": {"from": 600, "to": 0},
                "model": {"expr": "up", "refId": "A"}
            }"#,
        )
        .unwrap();

        assert_eq!(query.ref_id, "A");
        assert_eq!(query.query_type, "");
        assert_eq!(query.relative_time_range, RelativeTimeRange { from: 600, to: 0 });
        assert_eq!(query.model.get(), r#"{"expr": "up", "refId": "A"}"#);
        assert!(!query.is_expression());
    }
}
