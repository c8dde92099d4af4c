// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Metric type table: how each metric is aggregated and where it lands.

use serde::{Deserialize, Serialize};

pub const STEP_COUNT: &str = "step_count";
pub const DISTANCE_WALKING_RUNNING: &str = "distance_walking_running";
pub const ACTIVE_ENERGY_BURNED: &str = "active_energy_burned";
pub const EXERCISE_TIME: &str = "exercise_time";

/// How samples inside one bucket are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    CumulativeSum,
    DiscreteAverage,
    Duration,
}

/// Summary field a metric's value is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryField {
    Steps,
    Distance,
    Calories,
    ActivityMinutes,
}

/// Aggregation rule for one metric type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSpec {
    pub mode: AggregationMode,
    /// `None` means the value is not surfaced in any summary field
    pub field: Option<SummaryField>,
    /// Divisor from the data source's unit to the summary's unit
    pub divisor: f64,
}

impl MetricSpec {
    pub fn convert(&self, raw: f64) -> f64 {
        raw / self.divisor
    }
}

const METRIC_TABLE: &[(&str, MetricSpec)] = &[
    (
        STEP_COUNT,
        MetricSpec {
            mode: AggregationMode::CumulativeSum,
            field: Some(SummaryField::Steps),
            divisor: 1.0,
        },
    ),
    (
        DISTANCE_WALKING_RUNNING,
        MetricSpec {
            mode: AggregationMode::CumulativeSum,
            field: Some(SummaryField::Distance),
            // meters -> kilometers
            divisor: 1_000.0,
        },
    ),
    (
        ACTIVE_ENERGY_BURNED,
        MetricSpec {
            mode: AggregationMode::CumulativeSum,
            field: Some(SummaryField::Calories),
            divisor: 1.0,
        },
    ),
    (
        EXERCISE_TIME,
        MetricSpec {
            mode: AggregationMode::Duration,
            field: Some(SummaryField::ActivityMinutes),
            // seconds -> minutes
            divisor: 60.0,
        },
    ),
];

const FALLBACK: MetricSpec = MetricSpec {
    mode: AggregationMode::DiscreteAverage,
    field: None,
    divisor: 1.0,
};

/// Look up the aggregation rule for a metric identifier.
///
/// Unknown identifiers fall back to a discrete average that is not
/// mapped to any output field.
pub fn lookup(identifier: &str) -> MetricSpec {
    METRIC_TABLE
        .iter()
        .find(|(id, _)| *id == identifier)
        .map(|(_, spec)| *spec)
        .unwrap_or(FALLBACK)
}

/// All metric identifiers with a dedicated rule.
pub fn known_metrics() -> impl Iterator<Item = &'static str> {
    METRIC_TABLE.iter().map(|(id, _)| *id)
}
