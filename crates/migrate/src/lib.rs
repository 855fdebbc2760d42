//! Migration of legacy dashboard alerts into rules of the unified alerting engine.
//!
//! `OrgMigration::migrate_alert()` is the entry point. It parses the settings of a
//! legacy alert, translates its conditions, repairs queries which the engine cannot
//! run, and assembles a rule with unique title, routing labels, and provenance
//! annotations. Legacy behaviors without an equivalent are approximated, and the
//! approximation is logged and reported as a `Degradation`.
use models::{NotificationKey, SilenceKind};

mod alert_rule;
mod channels;
pub mod cli;
mod config;
pub mod naming;
mod queries;
mod silences;
mod states;
mod template;

pub use alert_rule::{ConditionTranslator, Migrated, OrgMigration};
pub use channels::{extract_channels, ChannelCache, ChannelResolver};
pub use config::Config;
pub use queries::repair_queries;
pub use silences::{add_silences, build_silence, required_silences, SilenceSink};
pub use states::{translate_exec_err, translate_no_data};
pub use template::{escape_literal, LegacyTemplates, MessageTemplater, TemplateError};

/// Error is a failure to migrate a legacy alert.
/// Each variant is a stage of migration which cannot proceed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parse settings")]
    Settings(#[source] serde_json::Error),
    #[error("transform conditions: {0:#}")]
    Conditions(anyhow::Error),
    #[error("queries: model of query {ref_id:?} is not a JSON object")]
    Queries {
        ref_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("deduplicate title")]
    Title(#[from] naming::DedupError),
}

impl Error {
    /// Name of the migration stage which failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Settings(_) => "settings",
            Self::Conditions(_) => "conditions",
            Self::Queries { .. } => "queries",
            Self::Title(_) => "naming",
        }
    }
}

/// Degradation is an aspect of a legacy alert which could not be migrated exactly.
/// Degradations never fail a migration, and are reported alongside the migrated rule.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Degradation {
    /// A notification channel reference matched no channel, and the rule won't route to it.
    UnresolvedChannel { key: NotificationKey },
    /// The message template failed to render fully, and a partial migration is used.
    TemplateFallback { error: String },
    /// A silence for a legacy "keep last state" option could not be created.
    SilenceFailed { kind: SilenceKind, error: String },
    /// The legacy no-data option is unknown, and the default state was used.
    UnknownNoDataOption { value: String },
    /// The legacy execution error option is unknown, and the default state was used.
    UnknownExecErrOption { value: String },
    /// A Prometheus query of type "Both" was converted into a range query.
    BothQueryConverted { ref_id: String },
    /// A Prometheus query mode isn't a boolean, and the query was left unchanged.
    UnparsableQueryMode { ref_id: String, field: String },
}
