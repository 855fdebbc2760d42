use crate::{Degradation, Error};
use indexmap::IndexMap;
use models::{AlertQuery, RawValue};
use serde_json::value::RawValue as JsonRawValue;

/// QueryModel is a query model which is being repaired.
/// Only a few well-known properties are inspected or modified,
/// and all others pass through verbatim and in their original order.
type QueryModel = IndexMap<String, Box<JsonRawValue>>;

// Visibility toggle of the legacy query editor, which has no meaning to the alerting engine.
const HIDE: &str = "hide";
// Graphite queries may reference other queries of the panel in `target`.
// `targetFull` holds the same query with all references expanded.
const GRAPHITE_TARGET: &str = "target";
const GRAPHITE_TARGET_FULL: &str = "targetFull";
// Prometheus query modes.
const INSTANT: &str = "instant";
const RANGE: &str = "range";
const DATASOURCE: &str = "datasource";
const PROMETHEUS_TYPE: &str = "prometheus";

/// Repair the queries of a migrated rule so they may be executed by the alerting engine.
/// Expressions are returned unchanged. Query order is preserved.
pub fn repair_queries(
    data: Vec<AlertQuery>,
    degraded: &mut Vec<Degradation>,
) -> Result<Vec<AlertQuery>, Error> {
    data.into_iter()
        .map(|query| repair_query(query, degraded))
        .collect()
}

fn repair_query(
    mut query: AlertQuery,
    degraded: &mut Vec<Degradation>,
) -> Result<AlertQuery, Error> {
    if query.is_expression() {
        return Ok(query);
    }
    let map_err = |source| Error::Queries {
        ref_id: query.ref_id.clone(),
        source,
    };

    let mut model: QueryModel = serde_json::from_str(query.model.get()).map_err(map_err)?;

    model.shift_remove(HIDE);
    fix_graphite_referenced_sub_queries(&mut model);

    if let Some(degradation) = fix_prometheus_both_type_query(&query.ref_id, &mut model)
        .map_err(map_err)?
    {
        degraded.push(degradation);
    }

    query.model = RawValue::from_serialize(&model).map_err(map_err)?;
    Ok(query)
}

/// The alerting engine cannot resolve references between Graphite queries,
/// so use the fully-expanded `targetFull` as the query `target`.
fn fix_graphite_referenced_sub_queries(model: &mut QueryModel) {
    if let Some(full) = model.shift_remove(GRAPHITE_TARGET_FULL) {
        model.insert(GRAPHITE_TARGET.to_string(), full);
    }
}

/// Convert a Prometheus query of type "Both" (instant *and* range) into a range query.
///
/// The alerting engine runs a query as either instant or range. A "Both" query could
/// be split in two with each half in its own condition, but that requires operator
/// precedence which classic conditions don't have. Range is the closer approximation,
/// since it retains the time series.
fn fix_prometheus_both_type_query(
    ref_id: &str,
    model: &mut QueryModel,
) -> serde_json::Result<Option<Degradation>> {
    let instant = match parse_mode(ref_id, model, INSTANT) {
        Ok(mode) => mode,
        Err(degradation) => return Ok(degradation),
    };
    let range = match parse_mode(ref_id, model, RANGE) {
        Ok(mode) => mode,
        Err(degradation) => return Ok(degradation),
    };

    if !instant || !range {
        return Ok(None); // Only "Both" queries are converted.
    }

    match is_prometheus_query(model) {
        Err(reason) => {
            tracing::info!(
                ref_id,
                %reason,
                "unable to convert query resembling a Prometheus 'Both' type query to 'Range'"
            );
            Ok(None)
        }
        Ok(false) => Ok(None),
        Ok(true) => {
            tracing::warn!(
                ref_id,
                "Prometheus 'Both' type queries are not supported by unified alerting, converting to range query"
            );
            model.insert(INSTANT.to_string(), serde_json::value::to_raw_value(&false)?);
            Ok(Some(Degradation::BothQueryConverted {
                ref_id: ref_id.to_string(),
            }))
        }
    }
}

// Parse the boolean query mode `field`, which is false if absent.
// If `field` isn't a boolean then the query is left alone, and this is
// reported only if the query is independently known to be Prometheus.
fn parse_mode(
    ref_id: &str,
    model: &QueryModel,
    field: &'static str,
) -> Result<bool, Option<Degradation>> {
    let Some(raw) = model.get(field) else {
        return Ok(false);
    };
    // A null mode is the same as an absent one.
    match serde_json::from_str::<Option<bool>>(raw.get()) {
        Ok(mode) => Ok(mode.unwrap_or_default()),
        Err(err) if matches!(is_prometheus_query(model), Ok(true)) => {
            tracing::info!(
                ref_id,
                field,
                value = raw.get(),
                %err,
                "failed to parse query mode of Prometheus query"
            );
            Err(Some(Degradation::UnparsableQueryMode {
                ref_id: ref_id.to_string(),
                field: field.to_string(),
            }))
        }
        Err(_) => Err(None),
    }
}

/// Determine whether the query model is of a Prometheus datasource.
/// An Err describes why the datasource type couldn't be determined.
fn is_prometheus_query(model: &QueryModel) -> Result<bool, String> {
    #[derive(serde::Deserialize)]
    struct Datasource {
        #[serde(default, rename = "type")]
        ds_type: String,
    }

    let Some(raw) = model.get(DATASOURCE) else {
        return Err("missing datasource field".to_string());
    };
    let datasource: Datasource = serde_json::from_str(raw.get())
        .map_err(|err| format!("parse datasource '{}': {err}", raw.get()))?;

    if datasource.ds_type.is_empty() {
        return Err(format!("missing type field '{}'", raw.get()));
    }
    Ok(datasource.ds_type == PROMETHEUS_TYPE)
}
