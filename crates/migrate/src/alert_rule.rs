use crate::{
    channels::{extract_channels, ChannelResolver},
    naming::{self, TitleDeduplicator},
    queries, silences, states, Config, Degradation, Error, LegacyTemplates, MessageTemplater,
    SilenceSink,
};
use models::{
    AlertRule, Condition, DashAlertSettings, DashboardUpgradeInfo, ExecutionErrorOption,
    LegacyAlert, NoDataOption,
};
use serde::Deserialize;
use std::collections::HashMap;

// Legacy alert state of paused alerts.
const PAUSED_STATE: &str = "paused";

/// ConditionTranslator translates the conditions of a legacy alert into
/// the queries and expressions of a rule, and the reference of its condition.
pub trait ConditionTranslator {
    fn translate(
        &self,
        alert: &LegacyAlert,
        settings: &DashAlertSettings,
    ) -> anyhow::Result<Condition>;
}

/// Migrated is a successfully migrated legacy alert.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Migrated {
    pub rule: AlertRule,
    /// Aspects of the legacy alert which could not be migrated exactly.
    pub degradations: Vec<Degradation>,
}

/// OrgMigration migrates the legacy alerts of a single organization.
///
/// It holds the title deduplicators of each folder which receives migrated rules,
/// so a single OrgMigration must be used for all alerts of a migration run.
pub struct OrgMigration<'a> {
    config: &'a Config,
    conditions: &'a dyn ConditionTranslator,
    channels: &'a dyn ChannelResolver,
    templater: &'a dyn MessageTemplater,
    title_deduplicators: HashMap<String, TitleDeduplicator>,
}

impl<'a> OrgMigration<'a> {
    pub fn new(
        config: &'a Config,
        conditions: &'a dyn ConditionTranslator,
        channels: &'a dyn ChannelResolver,
    ) -> Self {
        Self {
            config,
            conditions,
            channels,
            templater: &LegacyTemplates,
            title_deduplicators: HashMap::new(),
        }
    }

    /// Use `templater` to render the messages of migrated alerts.
    pub fn with_templater(mut self, templater: &'a dyn MessageTemplater) -> Self {
        self.templater = templater;
        self
    }

    /// Reserve the `titles` of rules which already exist in folder `folder_uid`.
    pub fn with_existing_titles<I, S>(mut self, folder_uid: &str, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.title_deduplicator_for_folder(folder_uid).reserve(titles);
        self
    }

    // The TitleDeduplicator of folder `folder_uid`, which is created on first use.
    fn title_deduplicator_for_folder(&mut self, folder_uid: &str) -> &mut TitleDeduplicator {
        let Self {
            config,
            title_deduplicators,
            ..
        } = self;

        title_deduplicators
            .entry(folder_uid.to_string())
            .or_insert_with(|| {
                TitleDeduplicator::new(config.max_title_length, config.case_insensitive_titles)
            })
    }

    /// Migrate a single legacy alert into a rule placed per `info`.
    ///
    /// Silences required by the alert's legacy "keep last state" options are
    /// added to `sink`. The rule is returned only if migration succeeded
    /// in full, and a failed migration leaves no trace in this OrgMigration.
    #[tracing::instrument(
        skip_all,
        fields(
            org_id = alert.org_id,
            alert_id = alert.id,
            panel_id = alert.panel_id,
            dashboard_uid = %info.dashboard_uid,
        )
    )]
    pub fn migrate_alert(
        &mut self,
        alert: &LegacyAlert,
        info: &DashboardUpgradeInfo,
        sink: &mut dyn SilenceSink,
    ) -> Result<Migrated, Error> {
        tracing::debug!("migrating alert rule to unified alerting");

        let settings = parse_settings(alert)?;
        let condition = self
            .conditions
            .translate(alert, &settings)
            .map_err(Error::Conditions)?;

        let mut degradations = Vec::new();
        let channels = extract_channels(self.channels, &settings, &mut degradations);

        let message = self.render_message(&alert.message, &mut degradations);
        let mut rule_labels = labels::build_labels(&settings, &channels);
        let annotations =
            labels::build_annotations(&info.dashboard_uid, alert.panel_id, alert.id, &message);

        let data = queries::repair_queries(condition.data, &mut degradations)?;
        let is_paused = alert.state == PAUSED_STATE;

        let max_title_length = self.config.max_title_length;
        let title = self
            .title_deduplicator_for_folder(&info.new_folder_uid)
            .deduplicate(&alert.name)?;

        if title != alert.name {
            tracing::info!(
                old = %alert.name,
                new = %title,
                max_title_length,
                "alert rule title modified to be unique within the folder and fit within the maximum length"
            );
        }

        let no_data_state = states::translate_no_data(&settings.no_data_state);
        if NoDataOption::parse(&settings.no_data_state).is_none() {
            degradations.push(Degradation::UnknownNoDataOption {
                value: settings.no_data_state.clone(),
            });
        }
        let exec_err_state = states::translate_exec_err(&settings.execution_error_state);
        if ExecutionErrorOption::parse(&settings.execution_error_state).is_none() {
            degradations.push(Degradation::UnknownExecErrOption {
                value: settings.execution_error_state.clone(),
            });
        }

        let interval_seconds =
            naming::adjust_interval(alert.frequency, self.config.base_interval_seconds);
        let rule_group = naming::group_name(
            interval_seconds,
            &info.dashboard_name,
            self.config.max_rule_group_name_length,
        );
        let uid = models::generate_short_uid();

        // Label for routing and silences.
        let (name, value) = labels::silence_matching_label(&uid);
        rule_labels.insert(name.to_string(), value);

        let rule = AlertRule {
            org_id: alert.org_id,
            uid,
            title,
            condition: condition.condition,
            data,
            interval_seconds,
            version: 1,
            namespace_uid: info.new_folder_uid.clone(),
            dashboard_uid: Some(info.dashboard_uid.clone()),
            panel_id: Some(alert.panel_id),
            rule_group,
            rule_group_index: 1, // Every rule is in its own group.
            for_duration: alert.for_duration,
            updated: chrono::Utc::now(),
            labels: rule_labels,
            annotations,
            is_paused,
            no_data_state,
            exec_err_state,
        };

        tracing::debug!(
            rule_uid = %rule.uid,
            title = %rule.title,
            rule_group = %rule.rule_group,
            contacts = ?labels::contacts(&rule.labels).collect::<Vec<_>>(),
            "migrated alert rule"
        );

        let kinds = silences::required_silences(&settings);
        silences::add_silences(
            sink,
            &kinds,
            &rule,
            self.config.silence_duration,
            &mut degradations,
        );

        Ok(Migrated { rule, degradations })
    }

    fn render_message(&self, message: &str, degradations: &mut Vec<Degradation>) -> String {
        match self.templater.render(message) {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::warn!(
                    field = "message",
                    %err,
                    "failed to migrate message template, using a partial migration"
                );
                degradations.push(Degradation::TemplateFallback {
                    error: err.to_string(),
                });
                err.fallback
            }
        }
    }
}

fn parse_settings(alert: &LegacyAlert) -> Result<DashAlertSettings, Error> {
    if alert.settings.is_null() {
        return Ok(DashAlertSettings::default());
    }
    DashAlertSettings::deserialize(&alert.settings).map_err(Error::Settings)
}

#[cfg(test)]
pub(crate) fn test_rule(uid: &str, title: &str) -> AlertRule {
    use chrono::TimeZone;

    AlertRule {
        org_id: 1,
        uid: uid.to_string(),
        title: title.to_string(),
        condition: "B".to_string(),
        data: Vec::new(),
        interval_seconds: 60,
        version: 1,
        namespace_uid: "folder-1".to_string(),
        dashboard_uid: Some("dash-1".to_string()),
        panel_id: Some(2),
        rule_group: "Infra - 1m".to_string(),
        rule_group_index: 1,
        for_duration: std::time::Duration::ZERO,
        updated: chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        labels: Default::default(),
        annotations: Default::default(),
        is_paused: false,
        no_data_state: models::NoDataState::NoData,
        exec_err_state: models::ExecutionErrorState::AlertingErrState,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ChannelCache;
    use models::{AlertNotification, AlertQuery, RawValue, Silence, SilenceKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tracing_test::traced_test;

    struct StaticConditions;

    impl ConditionTranslator for StaticConditions {
        fn translate(
            &self,
            _alert: &LegacyAlert,
            settings: &DashAlertSettings,
        ) -> anyhow::Result<Condition> {
            if settings.conditions.iter().any(|c| c == "unsupported") {
                anyhow::bail!("unsupported reducer");
            }
            let query = |ref_id: &str, datasource_uid: &str, model: serde_json::Value| AlertQuery {
                ref_id: ref_id.to_string(),
                query_type: String::new(),
                relative_time_range: models::RelativeTimeRange { from: 600, to: 0 },
                datasource_uid: datasource_uid.to_string(),
                model: RawValue::from_serialize(&model).unwrap(),
            };
            Ok(Condition {
                condition: "B".to_string(),
                data: vec![
                    query(
                        "A",
                        "prom-1",
                        json!({"expr": "up", "hide": false, "instant": true, "range": true,
                               "datasource": {"type": "prometheus", "uid": "prom-1"}}),
                    ),
                    query(
                        "B",
                        models::EXPRESSION_DATASOURCE_UID,
                        json!({"type": "classic_conditions", "hide": false}),
                    ),
                ],
            })
        }
    }

    fn channels() -> ChannelCache {
        ChannelCache::new(vec![AlertNotification {
            id: 1,
            uid: "ops".to_string(),
            name: "ops-email".to_string(),
            channel_type: "email".to_string(),
        }])
    }

    fn alert(name: &str, settings: serde_json::Value) -> LegacyAlert {
        LegacyAlert {
            id: 11,
            org_id: 1,
            dashboard_id: 3,
            panel_id: 2,
            name: name.to_string(),
            message: "CPU of ${instance} is high".to_string(),
            state: "ok".to_string(),
            frequency: 65,
            for_duration: std::time::Duration::from_secs(300),
            settings,
        }
    }

    fn info(folder: &str) -> DashboardUpgradeInfo {
        DashboardUpgradeInfo {
            dashboard_uid: "dash-1".to_string(),
            dashboard_name: "Infra".to_string(),
            new_folder_uid: folder.to_string(),
        }
    }

    #[test]
    #[traced_test]
    fn test_migrate_alert() {
        let config = Config::default();
        let channels = channels();
        let mut migration = OrgMigration::new(&config, &StaticConditions, &channels);
        let mut silences: Vec<Silence> = Vec::new();

        let settings = json!({
            "notifications": [{"uid": "ops"}, {"id": 99}],
            "noDataState": "keep_state",
            "executionErrorState": "alerting",
            "alertRuleTags": {"team": "infra"},
        });
        let Migrated { rule, degradations } = migration
            .migrate_alert(&alert("CPU High", settings), &info("folder-1"), &mut silences)
            .unwrap();

        assert_eq!(rule.title, "CPU High");
        assert_eq!(rule.condition, "B");
        assert_eq!(rule.interval_seconds, 60);
        assert_eq!(rule.rule_group, "Infra - 1m");
        assert_eq!(rule.rule_group_index, 1);
        assert_eq!(rule.version, 1);
        assert_eq!(rule.namespace_uid, "folder-1");
        assert_eq!(rule.dashboard_uid.as_deref(), Some("dash-1"));
        assert_eq!(rule.panel_id, Some(2));
        assert_eq!(rule.for_duration, std::time::Duration::from_secs(300));
        assert!(!rule.is_paused);
        assert_eq!(rule.no_data_state, models::NoDataState::NoData);
        assert_eq!(
            rule.exec_err_state,
            models::ExecutionErrorState::AlertingErrState
        );

        let mut labels = rule.labels.clone();
        assert_eq!(labels.remove("rule_uid"), Some(rule.uid.clone()));
        insta::assert_json_snapshot!(labels, @r###"
        {
          "__legacy_c_ops-email__": "true",
          "__legacy_use_channels__": "true",
          "team": "infra"
        }
        "###);
        insta::assert_json_snapshot!(rule.annotations, @r###"
        {
          "__alertId__": "11",
          "__dashboardUid__": "dash-1",
          "__panelId__": "2",
          "message": "{{- $mergedLabels := mergeLabelValues $values -}}\nCPU of {{index $mergedLabels \"instance\"}} is high"
        }
        "###);

        // Queries are repaired, and expressions are left alone.
        let models: Vec<_> = rule.data.iter().map(|q| q.model.to_value().unwrap()).collect();
        assert_eq!(
            models,
            vec![
                json!({"expr": "up", "instant": false, "range": true,
                       "datasource": {"type": "prometheus", "uid": "prom-1"}}),
                json!({"type": "classic_conditions", "hide": false}),
            ]
        );

        assert_eq!(
            degradations,
            vec![
                Degradation::UnresolvedChannel {
                    key: models::NotificationKey {
                        id: 99,
                        uid: String::new()
                    }
                },
                Degradation::BothQueryConverted {
                    ref_id: "A".to_string()
                },
            ]
        );

        assert_eq!(silences.len(), 1);
        assert_eq!(silences[0].kind, SilenceKind::NoData);
        assert_eq!(silences[0].matchers[1].value, rule.uid);
        assert!(logs_contain("failed to get alert notification, skipping"));
    }

    #[test]
    fn test_titles_are_unique_per_folder() {
        let config = Config::default();
        let channels = channels();
        let mut migration = OrgMigration::new(&config, &StaticConditions, &channels)
            .with_existing_titles("folder-2", ["Disk Full"]);
        let mut silences: Vec<Silence> = Vec::new();

        let mut migrate = |name: &str, folder: &str| {
            migration
                .migrate_alert(&alert(name, json!({})), &info(folder), &mut silences)
                .unwrap()
                .rule
                .title
        };

        assert_eq!(migrate("CPU High", "folder-1"), "CPU High");
        assert_eq!(migrate("CPU High", "folder-1"), "CPU High #2");
        assert_eq!(migrate("CPU High", "folder-2"), "CPU High");
        assert_eq!(migrate("Disk Full", "folder-2"), "Disk Full #2");
        assert_eq!(migrate("Disk Full", "folder-1"), "Disk Full");
    }

    #[test]
    fn test_paused_alert() {
        let config = Config::default();
        let channels = channels();
        let mut migration = OrgMigration::new(&config, &StaticConditions, &channels);
        let mut silences: Vec<Silence> = Vec::new();

        let mut paused = alert("Paused", json!(null));
        paused.state = "paused".to_string();

        let Migrated { rule, .. } = migration
            .migrate_alert(&paused, &info("folder-1"), &mut silences)
            .unwrap();
        assert!(rule.is_paused);
        assert!(silences.is_empty());
    }

    #[test]
    #[traced_test]
    fn test_unknown_options_and_template_failures_degrade() {
        let config = Config::default();
        let channels = channels();
        let mut migration = OrgMigration::new(&config, &StaticConditions, &channels);
        let mut silences: Vec<Silence> = Vec::new();

        let mut legacy = alert(
            "CPU High",
            json!({"noDataState": "pending", "executionErrorState": "keep_state"}),
        );
        legacy.message = "Cost of {{team}} in ${region} is ${cost".to_string();

        let Migrated { rule, degradations } = migration
            .migrate_alert(&legacy, &info("folder-1"), &mut silences)
            .unwrap();

        // The message is partially migrated, and never left with live template actions.
        insta::assert_snapshot!(rule.annotations[labels::MESSAGE].as_str(), @r###"
        {{- $mergedLabels := mergeLabelValues $values -}}
        {{`Cost of {{team}} in `}}{{index $mergedLabels "region"}} is ${cost
        "###);
        assert_eq!(rule.no_data_state, models::NoDataState::NoData);
        assert_eq!(
            rule.exec_err_state,
            models::ExecutionErrorState::ErrorErrState
        );
        assert_eq!(
            degradations,
            vec![
                Degradation::TemplateFallback {
                    error: "variable starting at byte 33 is not terminated".to_string()
                },
                Degradation::BothQueryConverted {
                    ref_id: "A".to_string()
                },
                Degradation::UnknownNoDataOption {
                    value: "pending".to_string()
                },
            ]
        );

        // Only the error silence is created, scoped to the rule.
        assert_eq!(silences.len(), 1);
        assert_eq!(silences[0].kind, SilenceKind::Error);
        assert_eq!(silences[0].matchers[0].value, "DatasourceError");
        assert_eq!(silences[0].matchers[1].name, "rule_uid");
        assert_eq!(silences[0].matchers[1].value, rule.uid);

        assert!(logs_contain("failed to migrate message template"));
        assert!(logs_contain("unable to translate legacy NoData option"));
    }

    #[test]
    fn test_hard_failures() {
        let config = Config {
            max_title_length: 2,
            ..Default::default()
        };
        let channels = channels();
        let mut migration = OrgMigration::new(&config, &StaticConditions, &channels);
        let mut silences: Vec<Silence> = Vec::new();

        let err = migration
            .migrate_alert(
                &alert("A", json!({"notifications": {"id": 1}})),
                &info("folder-1"),
                &mut silences,
            )
            .unwrap_err();
        assert_eq!(err.stage(), "settings");

        let err = migration
            .migrate_alert(
                &alert("A", json!({"conditions": ["unsupported"]})),
                &info("folder-1"),
                &mut silences,
            )
            .unwrap_err();
        assert_eq!(err.stage(), "conditions");
        assert_eq!(err.to_string(), "transform conditions: unsupported reducer");

        // Failed migrations don't reserve a title.
        let ok = migration
            .migrate_alert(&alert("A", json!({})), &info("folder-1"), &mut silences)
            .unwrap();
        assert_eq!(ok.rule.title, "A");

        let err = migration
            .migrate_alert(&alert("A", json!({})), &info("folder-1"), &mut silences)
            .unwrap_err();
        assert_eq!(err.stage(), "naming");
        assert!(silences.is_empty());
    }
}
