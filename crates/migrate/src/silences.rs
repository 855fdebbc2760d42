use crate::Degradation;
use chrono::{DateTime, Utc};
use models::{
    AlertRule, DashAlertSettings, ExecutionErrorOption, Matcher, NoDataOption, Silence,
    SilenceKind,
};

const CREATED_BY: &str = "Alert migration";

/// SilenceSink accepts silences which are created during migration.
pub trait SilenceSink {
    fn add_silence(&mut self, silence: Silence) -> anyhow::Result<()>;
}

impl SilenceSink for Vec<Silence> {
    fn add_silence(&mut self, silence: Silence) -> anyhow::Result<()> {
        self.push(silence);
        Ok(())
    }
}

/// Kinds of silences required by a legacy alert.
///
/// The legacy "keep last state" options have no equivalent in the alerting engine.
/// Rules instead enter the Error or NoData state, and the engine raises a synthetic
/// alert which is silenced so that the rule stays quiet as it did before.
pub fn required_silences(settings: &DashAlertSettings) -> Vec<SilenceKind> {
    let mut kinds = Vec::new();

    if ExecutionErrorOption::parse(&settings.execution_error_state)
        == Some(ExecutionErrorOption::KeepState)
    {
        kinds.push(SilenceKind::Error);
    }
    if NoDataOption::parse(&settings.no_data_state) == Some(NoDataOption::KeepState) {
        kinds.push(SilenceKind::NoData);
    }
    kinds
}

/// Build a Silence of `kind` which matches only the synthetic alerts of `rule`.
pub fn build_silence(
    kind: SilenceKind,
    rule: &AlertRule,
    now: DateTime<Utc>,
    duration: std::time::Duration,
) -> Silence {
    let (name, value) = labels::silence_matching_label(&rule.uid);
    let ends_at = chrono::Duration::from_std(duration)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    Silence {
        id: uuid::Uuid::new_v4().to_string(),
        kind,
        matchers: vec![
            Matcher::equal(labels::ALERT_NAME, kind.alert_name()),
            Matcher::equal(name, value),
        ],
        starts_at: now,
        ends_at,
        created_by: CREATED_BY.to_string(),
        comment: format!(
            "Created during migration to silence the {kind} state of alert rule '{}' (UID {}), \
             because its legacy alert was configured to keep its last state",
            rule.title, rule.uid,
        ),
    }
}

/// Create the silences of `kinds` for `rule` through `sink`.
/// Silences are best-effort: failures are logged and recorded, and never fail migration.
pub fn add_silences<S: SilenceSink + ?Sized>(
    sink: &mut S,
    kinds: &[SilenceKind],
    rule: &AlertRule,
    duration: std::time::Duration,
    degraded: &mut Vec<Degradation>,
) {
    let now = Utc::now();

    for kind in kinds {
        let silence = build_silence(*kind, rule, now, duration);
        tracing::debug!(%kind, silence_id = %silence.id, rule_uid = %rule.uid, "adding silence");

        if let Err(err) = sink.add_silence(silence) {
            tracing::error!(
                %kind,
                rule_name = %rule.title,
                error = %format!("{err:#}"),
                "failed to create silence"
            );
            degraded.push(Degradation::SilenceFailed {
                kind: *kind,
                error: format!("{err:#}"),
            });
        }
    }
}
