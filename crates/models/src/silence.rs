use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SilenceKind is the synthetic alert which a Silence suppresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SilenceKind {
    /// Suppresses the alert raised when rule evaluation fails.
    Error,
    /// Suppresses the alert raised when rule queries return no data.
    NoData,
}

impl SilenceKind {
    /// Name of the synthetic alert which the engine raises for this kind.
    pub fn alert_name(&self) -> &'static str {
        match self {
            Self::Error => "DatasourceError",
            Self::NoData => "DatasourceNoData",
        }
    }
}

impl std::fmt::Display for SilenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::NoData => "no-data",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Equal,
}

/// Matcher selects alerts having a label `name` which matches `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matcher {
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub name: String,
    pub value: String,
}

impl Matcher {
    pub fn equal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            match_type: MatchType::Equal,
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Silence suppresses notifications of alerts matching all of its matchers,
/// between `starts_at` and `ends_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Silence {
    pub id: String,
    pub kind: SilenceKind,
    pub matchers: Vec<Matcher>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_by: String,
    pub comment: String,
}
