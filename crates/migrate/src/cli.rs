use crate::{ChannelCache, Config, ConditionTranslator, Migrated, OrgMigration};
use anyhow::Context;
use models::{
    AlertNotification, Condition, DashAlertSettings, DashboardUpgradeInfo, LegacyAlert, Silence,
};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

/// alert-migrate migrates legacy dashboard alerts into unified alerting rules,
/// and writes the migrated rules and silences to stdout in jsonl format.
#[derive(Debug, clap::Parser)]
#[clap(author, version, rename_all = "kebab-case")]
pub struct Args {
    /// Path to a JSON batch of legacy alerts to migrate.
    #[clap(long)]
    pub input: std::path::PathBuf,
    /// Path to a YAML or JSON configuration file. Defaults are used if absent.
    #[clap(long, env = "ALERT_MIGRATE_CONFIG")]
    pub config: Option<std::path::PathBuf>,
    /// Filter of emitted logs, such as "info" or "migrate=debug".
    #[clap(long, default_value = "info", env = "ALERT_MIGRATE_LOG")]
    pub log: String,
}

/// Batch is the input of a migration run.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Legacy notification channels which alerts may reference.
    #[serde(default)]
    pub channels: Vec<AlertNotification>,
    pub alerts: Vec<BatchAlert>,
    /// Titles of rules which already exist, keyed on org ID and then folder UID.
    #[serde(default)]
    pub existing_titles: BTreeMap<i64, BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, serde::Deserialize)]
pub struct BatchAlert {
    pub alert: LegacyAlert,
    pub upgrade: DashboardUpgradeInfo,
    /// Translation of the alert's classic conditions.
    pub condition: Condition,
}

/// Output is a single line of migration output.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
enum Output<'a> {
    Rule(&'a Migrated),
    Silence(&'a Silence),
}

/// TranslatedConditions is a ConditionTranslator over conditions which were
/// translated ahead of time, keyed on legacy alert ID.
pub struct TranslatedConditions(pub HashMap<i64, Condition>);

impl ConditionTranslator for TranslatedConditions {
    fn translate(
        &self,
        alert: &LegacyAlert,
        _settings: &DashAlertSettings,
    ) -> anyhow::Result<Condition> {
        self.0
            .get(&alert.id)
            .cloned()
            .with_context(|| format!("no condition translation for alert {}", alert.id))
    }
}

/// Run a migration with the given Args.
/// Returns whether every alert of the batch was migrated.
pub fn run(args: &Args) -> anyhow::Result<bool> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let content = std::fs::read(&args.input)
        .with_context(|| format!("failed to read input {}", args.input.display()))?;
    let batch: Batch = serde_json::from_slice(&content)
        .with_context(|| format!("failed to parse input {}", args.input.display()))?;

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());

    let failed = migrate_batch(batch, &config, &mut out)?;
    out.flush()?;

    Ok(failed == 0)
}

/// Migrate all alerts of `batch`, writing migrated rules and silences to `out`.
/// Returns the number of alerts which failed to migrate.
pub fn migrate_batch<W: Write>(
    batch: Batch,
    config: &Config,
    out: &mut W,
) -> anyhow::Result<usize> {
    let Batch {
        channels,
        alerts,
        existing_titles,
    } = batch;

    let channels = ChannelCache::new(channels);
    let conditions = TranslatedConditions(
        alerts
            .iter()
            .map(|a| (a.alert.id, a.condition.clone()))
            .collect(),
    );
    let mut orgs: BTreeMap<i64, OrgMigration> = BTreeMap::new();
    let mut failed = 0;

    for BatchAlert { alert, upgrade, .. } in &alerts {
        let org = orgs.entry(alert.org_id).or_insert_with(|| {
            let mut org = OrgMigration::new(config, &conditions, &channels);

            for (folder_uid, titles) in existing_titles.get(&alert.org_id).into_iter().flatten() {
                org = org.with_existing_titles(folder_uid, titles);
            }
            org
        });

        let mut silences: Vec<Silence> = Vec::new();
        match org.migrate_alert(alert, upgrade, &mut silences) {
            Ok(migrated) => {
                write_line(out, &Output::Rule(&migrated))?;
                for silence in &silences {
                    write_line(out, &Output::Silence(silence))?;
                }
            }
            Err(err) => {
                let stage = err.stage();
                tracing::error!(
                    org_id = alert.org_id,
                    alert_id = alert.id,
                    stage,
                    error = %format!("{:#}", anyhow::Error::from(err)),
                    "failed to migrate alert, skipping"
                );
                failed += 1;
            }
        }
    }

    tracing::info!(
        alerts = alerts.len(),
        failed,
        orgs = orgs.len(),
        "finished migrating alerts"
    );
    Ok(failed)
}

fn write_line<W: Write>(out: &mut W, output: &Output) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, output)?;
    out.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn batch() -> Batch {
        let alert = |id: i64, org_id: i64, name: &str, settings: serde_json::Value| {
            json!({
                "alert": {
                    "id": id,
                    "orgId": org_id,
                    "dashboardId": 1,
                    "panelId": 4,
                    "name": name,
                    "frequency": 60,
                    "for": "5m",
                    "settings": settings,
                },
                "upgrade": {
                    "dashboardUid": "dash-1",
                    "dashboardName": "Infra",
                    "newFolderUid": "folder-1",
                },
                "condition": {
                    "condition": "A",
                    "data": [{
                        "refId": "A",
                        "datasourceUid": "loki-1",
                        "model": {"expr": "count_over_time({job=\"api\"}[5m])", "hide": true},
                    }],
                },
            })
        };

        serde_json::from_value(json!({
            "channels": [{"id": 1, "uid": "ops", "name": "ops-email", "type": "email"}],
            "alerts": [
                alert(1, 1, "Errors", json!({"notifications": [{"uid": "ops"}], "noDataState": "keep_state"})),
                alert(2, 1, "Errors", json!({"notifications": "bad"})),
                alert(3, 1, "Errors", json!({})),
                alert(4, 2, "Errors", json!({})),
            ],
            "existingTitles": {"2": {"folder-1": ["errors"]}},
        }))
        .unwrap()
    }

    #[test]
    fn test_migrate_batch() {
        let mut out = Vec::new();
        let failed = migrate_batch(batch(), &Config::default(), &mut out).unwrap();
        assert_eq!(failed, 1);

        let lines: Vec<serde_json::Value> = std::str::from_utf8(&out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        let summary: Vec<_> = lines
            .iter()
            .map(|line| match (line.get("rule"), line.get("silence")) {
                (Some(migrated), None) => format!(
                    "rule org={} title={} group={}",
                    migrated["rule"]["orgId"],
                    migrated["rule"]["title"],
                    migrated["rule"]["ruleGroup"],
                ),
                (None, Some(silence)) => format!("silence kind={}", silence["kind"]),
                _ => panic!("unexpected line {line}"),
            })
            .collect();

        insta::assert_json_snapshot!(summary, @r###"
        [
          "rule org=1 title=\"Errors\" group=\"Infra - 1m\"",
          "silence kind=\"no-data\"",
          "rule org=1 title=\"Errors #2\" group=\"Infra - 1m\"",
          "rule org=2 title=\"Errors #2\" group=\"Infra - 1m\""
        ]
        "###);

        // Silences match the rule they were created for.
        let rule_uid = &lines[0]["rule"]["rule"]["uid"];
        assert_eq!(&lines[0]["rule"]["rule"]["labels"]["rule_uid"], rule_uid);
        assert_eq!(&lines[1]["silence"]["matchers"][1]["value"], rule_uid);

        // Query models are repaired.
        assert_eq!(
            lines[0]["rule"]["rule"]["data"][0]["model"],
            json!({"expr": "count_over_time({job=\"api\"}[5m])"})
        );
    }

    #[test]
    fn test_missing_condition_translation() {
        let conditions = TranslatedConditions(HashMap::new());
        let alert: LegacyAlert = serde_json::from_value(json!({
            "id": 7, "orgId": 1, "dashboardId": 1, "panelId": 1, "name": "x", "frequency": 10,
        }))
        .unwrap();

        let err = conditions
            .translate(&alert, &DashAlertSettings::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "no condition translation for alert 7");
    }
}
