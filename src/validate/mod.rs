//! Output validation.
//!
//! Every metric object is serialized and checked against its schema before it
//! may be written. A rejected object is never persisted.

pub mod schema;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::MetricId;
use crate::error::PipelineError;

pub use schema::{Field, MetricSchema, Rule};

fn chart_point() -> Rule {
    Rule::Object(vec![
        Field::required("date", Rule::text()),
        Field::required("value", Rule::number()),
    ])
}

fn common_tail(mut fields: Vec<Field>) -> Vec<Field> {
    fields.push(Field::required("lastUpdated", Rule::Timestamp));
    fields.push(Field::optional("isFallback", Rule::Bool));
    fields
}

/// The fixed schema for `metric`.
pub fn schema_for(metric: MetricId) -> MetricSchema {
    let name = metric.display_name();
    let fields = match metric {
        MetricId::PurchasingPower => vec![
            Field::required("value", Rule::range(-50.0, 50.0)),
            Field::required("data", Rule::non_empty_array(chart_point())),
            Field::required("cumulativeValue", Rule::range(-100.0, 200.0)),
            Field::required("cumulativeData", Rule::non_empty_array(chart_point())),
            Field::required("baselineDate", Rule::text()),
        ],
        MetricId::EssentialsInflation => vec![
            Field::required("value", Rule::range(-20.0, 50.0)),
            Field::required("headlineCPI", Rule::range(-20.0, 50.0)),
            Field::required(
                "data",
                Rule::non_empty_array(Rule::Object(vec![
                    Field::required("date", Rule::text()),
                    Field::required("essentials", Rule::number()),
                    Field::required("headline", Rule::number()),
                ])),
            ),
        ],
        MetricId::ConsumerSentiment => vec![
            Field::required("value", Rule::range(0.0, 200.0)),
            Field::required("data", Rule::non_empty_array(chart_point())),
        ],
        MetricId::SahmRule => vec![
            Field::required("value", Rule::range(-5.0, 10.0)),
            Field::required("isRecessionSignal", Rule::Bool),
            Field::required("data", Rule::non_empty_array(chart_point())),
        ],
        MetricId::HouseholdDebt => vec![
            Field::required("value", Rule::range(0.0, 30.0)),
            Field::required("data", Rule::non_empty_array(chart_point())),
        ],
        MetricId::FinancialCushion => vec![
            Field::required("canCover400", Rule::range(0.0, 100.0)),
            Field::required("cannotCover400", Rule::range(0.0, 100.0)),
            Field::required("has3MonthSavings", Rule::range(0.0, 100.0)),
            Field::required("year", Rule::integer(2000, 2100)),
            Field::required(
                "data",
                Rule::non_empty_array(Rule::Object(vec![
                    Field::required("year", Rule::integer(2000, 2100)),
                    Field::required("canCover400", Rule::range(0.0, 100.0)),
                ])),
            ),
        ],
    };
    MetricSchema::new(name, common_tail(fields))
}

/// Serialize `output` and check it against the metric's schema.
///
/// Returns the exact JSON value that passed, ready to persist.
pub fn validate_output<T: Serialize>(metric: MetricId, output: &T) -> Result<Value, PipelineError> {
    let candidate = serde_json::to_value(output)?;
    if let Err(err) = schema_for(metric).validate(&candidate) {
        for issue in &err.issues {
            warn!(%metric, issue = %issue, "validation issue");
        }
        return Err(err.into());
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChartPoint, PurchasingPower, SahmRule};
    use quickcheck_macros::quickcheck;

    fn purchasing_power(value: f64) -> PurchasingPower {
        PurchasingPower {
            value,
            data: vec![ChartPoint {
                label: "Q2 2025".to_string(),
                value,
            }],
            cumulative_value: 4.2,
            cumulative_data: vec![ChartPoint {
                label: "Q2 2025".to_string(),
                value: 4.2,
            }],
            baseline_date: "Q3 2015".to_string(),
            last_updated: "2025-08-01T06:00:00.000Z".to_string(),
            is_fallback: false,
        }
    }

    #[test]
    fn accepts_plausible_purchasing_power() {
        let value = validate_output(MetricId::PurchasingPower, &purchasing_power(1.4)).unwrap();
        assert_eq!(value["baselineDate"], "Q3 2015");
    }

    #[test]
    fn rejects_implausible_purchasing_power() {
        let err = validate_output(MetricId::PurchasingPower, &purchasing_power(63.0)).unwrap_err();
        match err {
            PipelineError::Validation(v) => {
                assert_eq!(v.metric, "Purchasing Power");
                assert!(v.issues.iter().any(|i| i.starts_with("value:")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_nan_anywhere_in_the_series() {
        let mut out = purchasing_power(1.0);
        out.cumulative_data[0].value = f64::NAN;
        assert!(validate_output(MetricId::PurchasingPower, &out).is_err());
    }

    #[test]
    fn sahm_rule_requires_signal_flag() {
        let out = SahmRule {
            value: 0.43,
            is_recession_signal: false,
            data: vec![ChartPoint {
                label: "Jul 2025".to_string(),
                value: 0.43,
            }],
            last_updated: "2025-08-01T06:00:00.000Z".to_string(),
            is_fallback: false,
        };
        assert!(validate_output(MetricId::SahmRule, &out).is_ok());
        let mut raw = serde_json::to_value(&out).unwrap();
        raw.as_object_mut().unwrap().remove("isRecessionSignal");
        assert!(schema_for(MetricId::SahmRule).validate(&raw).is_err());
    }

    #[test]
    fn every_metric_has_a_schema_requiring_last_updated() {
        for metric in MetricId::ALL {
            let schema = schema_for(metric);
            assert!(
                schema.fields.iter().any(|f| f.name == "lastUpdated" && f.required),
                "{metric} lacks lastUpdated"
            );
        }
    }

    #[quickcheck]
    fn accepted_purchasing_power_is_always_in_range(value: f64) -> bool {
        match validate_output(MetricId::PurchasingPower, &purchasing_power(value)) {
            Ok(_) => (-50.0..=50.0).contains(&value),
            Err(_) => !(-50.0..=50.0).contains(&value) || !value.is_finite(),
        }
    }
}
