//! Panel projections.
//!
//! Each function takes one sub-object of a [`DashboardSnapshot`] and returns
//! a complete chart configuration for one panel. Projections are pure: the
//! output depends only on the input, and every update is a full redraw.
//! Categorical maps are ordered, so equal inputs always produce equal
//! category order.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::snapshot::{DashboardSnapshot, HistoricalPoint, SystemPerformance};

/// Divisor bringing network throughput onto the radar's 0–100 scale.
pub const NETWORK_SCALE: f64 = 5.0;

/// Upper bound of every radar axis and of the gauge.
pub const PERCENT_MAX: f64 = 100.0;

/// The five dashboard panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    /// Daily alert trend.
    AlertTrend,
    /// Threat index gauge.
    ThreatGauge,
    /// Alert type distribution.
    AlertTypes,
    /// Attack source distribution.
    AttackSources,
    /// Host resource radar.
    SystemPerformance,
}

impl PanelKind {
    /// All panels in render order.
    pub const ALL: [Self; 5] = [
        Self::AlertTrend,
        Self::ThreatGauge,
        Self::AlertTypes,
        Self::AttackSources,
        Self::SystemPerformance,
    ];
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AlertTrend => "alert-trend",
            Self::ThreatGauge => "threat-gauge",
            Self::AlertTypes => "alert-types",
            Self::AttackSources => "attack-sources",
            Self::SystemPerformance => "system-performance",
        };
        f.write_str(s)
    }
}

/// A named data series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Legend label.
    pub name: String,
    /// One value per category.
    pub data: Vec<f64>,
}

/// Line chart over dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    /// Chart title.
    pub title: String,
    /// X axis categories.
    pub categories: Vec<String>,
    /// Line series.
    pub series: Vec<Series>,
}

/// Single-value gauge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeChart {
    /// Label under the value.
    pub label: String,
    /// Displayed value, one decimal place.
    pub value: f64,
    /// Lower bound of the dial.
    pub min: f64,
    /// Upper bound of the dial.
    pub max: f64,
}

/// One pie slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    /// Category.
    pub name: String,
    /// Count.
    pub value: f64,
}

/// Pie chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    /// Chart title.
    pub title: String,
    /// Series label shown in tooltips.
    pub series_name: String,
    /// Slices in category order.
    pub slices: Vec<Slice>,
}

/// Bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    /// Chart title.
    pub title: String,
    /// X axis categories.
    pub categories: Vec<String>,
    /// Bar series.
    pub series: Series,
}

/// One radar axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicator {
    /// Axis label.
    pub name: String,
    /// Axis maximum.
    pub max: f64,
}

/// Radar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarChart {
    /// Chart title.
    pub title: String,
    /// Axes.
    pub indicators: Vec<Indicator>,
    /// Plotted series, one value per indicator.
    pub series: Series,
}

/// A full redraw of one panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum PanelUpdate {
    /// Daily alert trend.
    AlertTrend(TrendChart),
    /// Threat index gauge.
    ThreatGauge(GaugeChart),
    /// Alert type distribution.
    AlertTypes(PieChart),
    /// Attack source distribution.
    AttackSources(BarChart),
    /// Host resource radar.
    SystemPerformance(RadarChart),
}

impl PanelUpdate {
    /// Which panel this update redraws.
    #[must_use]
    pub const fn kind(&self) -> PanelKind {
        match self {
            Self::AlertTrend(_) => PanelKind::AlertTrend,
            Self::ThreatGauge(_) => PanelKind::ThreatGauge,
            Self::AlertTypes(_) => PanelKind::AlertTypes,
            Self::AttackSources(_) => PanelKind::AttackSources,
            Self::SystemPerformance(_) => PanelKind::SystemPerformance,
        }
    }
}

/// Total and high-severity alerts per day.
#[must_use]
pub fn alert_trend(history: &[HistoricalPoint]) -> TrendChart {
    let column = |f: fn(&HistoricalPoint) -> i64| -> Vec<f64> {
        history.iter().map(|p| as_f64(f(p))).collect()
    };

    TrendChart {
        title: "Security Alert Trend".into(),
        categories: history.iter().map(|p| p.date.clone()).collect(),
        series: vec![
            Series {
                name: "Total Alerts".into(),
                data: column(|p| p.alert_count),
            },
            Series {
                name: "High Severity".into(),
                data: column(|p| p.high_severity),
            },
        ],
    }
}

/// Threat index on a 0–100 dial.
#[must_use]
pub fn threat_gauge(threat_level: f64) -> GaugeChart {
    GaugeChart {
        label: "Threat Index".into(),
        value: round_one_decimal(threat_level),
        min: 0.0,
        max: PERCENT_MAX,
    }
}

/// Alert counts by type.
#[must_use]
pub fn alert_types(types: &BTreeMap<String, i64>) -> PieChart {
    PieChart {
        title: "Alert Type Distribution".into(),
        series_name: "Alert Types".into(),
        slices: types
            .iter()
            .map(|(name, value)| Slice {
                name: name.clone(),
                value: as_f64(*value),
            })
            .collect(),
    }
}

/// Attack counts by source.
#[must_use]
pub fn attack_sources(sources: &BTreeMap<String, i64>) -> BarChart {
    BarChart {
        title: "Attack Source Distribution".into(),
        categories: sources.keys().cloned().collect(),
        series: Series {
            name: "Attacks".into(),
            data: sources.values().map(|v| as_f64(*v)).collect(),
        },
    }
}

/// Host resources on a shared 0–100 radar. Network throughput is divided by
/// [`NETWORK_SCALE`]; the other metrics are already percentages or close to
/// that range.
#[must_use]
pub fn system_performance(perf: &SystemPerformance) -> RadarChart {
    let axis = |name: &str| Indicator {
        name: name.into(),
        max: PERCENT_MAX,
    };
    RadarChart {
        title: "System Performance".into(),
        indicators: vec![
            axis("CPU Usage"),
            axis("Memory Usage"),
            axis("Network Traffic"),
            axis("Disk I/O"),
        ],
        series: Series {
            name: "Current".into(),
            data: vec![
                perf.cpu_usage,
                perf.memory_usage,
                perf.network_traffic / NETWORK_SCALE,
                perf.disk_io,
            ],
        },
    }
}

/// Project every panel of `snapshot`, in [`PanelKind::ALL`] order.
#[must_use]
pub fn project(snapshot: &DashboardSnapshot) -> [PanelUpdate; 5] {
    [
        PanelUpdate::AlertTrend(alert_trend(&snapshot.historical_data)),
        PanelUpdate::ThreatGauge(threat_gauge(snapshot.threat_intelligence.threat_level)),
        PanelUpdate::AlertTypes(alert_types(&snapshot.security_alerts.alert_types)),
        PanelUpdate::AttackSources(attack_sources(&snapshot.threat_intelligence.attack_sources)),
        PanelUpdate::SystemPerformance(system_performance(&snapshot.system_performance)),
    ]
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(value: i64) -> f64 {
    value as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::sample_payload;
    use test_case::test_case;

    fn sample() -> DashboardSnapshot {
        serde_json::from_value(sample_payload()).expect("snapshot")
    }

    #[test]
    fn network_traffic_is_rescaled() {
        let radar = system_performance(&SystemPerformance {
            cpu_usage: 10.0,
            memory_usage: 20.0,
            network_traffic: 250.0,
            disk_io: 30.0,
        });

        assert_eq!(radar.series.data, vec![10.0, 20.0, 50.0, 30.0]);
        assert!(radar.indicators.iter().all(|i| (i.max - 100.0).abs() < f64::EPSILON));
        assert_eq!(radar.indicators[2].name, "Network Traffic");
    }

    #[test_case(47.26, 47.3 ; "rounds up")]
    #[test_case(47.24, 47.2 ; "rounds down")]
    #[test_case(0.0, 0.0 ; "zero")]
    #[test_case(100.0, 100.0 ; "ceiling")]
    fn gauge_rounds_to_one_decimal(level: f64, expected: f64) {
        let gauge = threat_gauge(level);
        assert!((gauge.value - expected).abs() < 1e-9, "{} != {expected}", gauge.value);
        assert!((gauge.max - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trend_has_two_series_over_dates() {
        let chart = alert_trend(&sample().historical_data);

        assert_eq!(chart.categories, vec!["2024-04-30", "2024-05-01"]);
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].data, vec![120.0, 95.0]);
        assert_eq!(chart.series[1].data, vec![20.0, 14.0]);
    }

    #[test]
    fn categorical_panels_are_ordered_by_name() {
        let snapshot = sample();
        let pie = alert_types(&snapshot.security_alerts.alert_types);
        let names: Vec<&str> = pie.slices.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Anomalous Access", "Intrusion", "Malware", "Other"]);

        let bar = attack_sources(&snapshot.threat_intelligence.attack_sources);
        assert_eq!(bar.categories, vec!["Asia", "Europe", "North America", "Other"]);
        assert_eq!(bar.series.data, vec![40.0, 25.0, 30.0, 5.0]);
    }

    #[test]
    fn project_covers_every_panel_once() {
        let kinds: Vec<PanelKind> = project(&sample()).iter().map(PanelUpdate::kind).collect();
        assert_eq!(kinds, PanelKind::ALL.to_vec());
    }

    #[test]
    fn empty_inputs_project_empty_charts() {
        let snapshot = DashboardSnapshot::default();
        let [trend, _, pie, bar, _] = project(&snapshot);

        assert!(matches!(trend, PanelUpdate::AlertTrend(ref c) if c.categories.is_empty()));
        assert!(matches!(pie, PanelUpdate::AlertTypes(ref c) if c.slices.is_empty()));
        assert!(matches!(bar, PanelUpdate::AttackSources(ref c) if c.categories.is_empty()));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_perf() -> impl Strategy<Value = SystemPerformance> {
            (0.0..100.0f64, 0.0..100.0f64, 0.0..1000.0f64, 0.0..200.0f64).prop_map(
                |(cpu_usage, memory_usage, network_traffic, disk_io)| SystemPerformance {
                    cpu_usage,
                    memory_usage,
                    network_traffic,
                    disk_io,
                },
            )
        }

        fn arb_counts() -> impl Strategy<Value = BTreeMap<String, i64>> {
            prop::collection::btree_map("[a-z]{1,8}", -50i64..5000, 0..8)
        }

        fn arb_history() -> impl Strategy<Value = Vec<HistoricalPoint>> {
            prop::collection::vec(
                ("[0-9]{4}-[0-9]{2}-[0-9]{2}", 0i64..10_000, 0i64..10_000, 0.0..100.0f64).prop_map(
                    |(date, alert_count, high_severity, threat_level)| HistoricalPoint {
                        date,
                        alert_count,
                        high_severity,
                        threat_level,
                    },
                ),
                0..14,
            )
        }

        proptest! {
            #[test]
            fn projections_are_deterministic(
                perf in arb_perf(),
                types in arb_counts(),
                sources in arb_counts(),
                history in arb_history(),
                level in 0.0..100.0f64,
            ) {
                prop_assert_eq!(system_performance(&perf), system_performance(&perf));
                prop_assert_eq!(alert_types(&types), alert_types(&types));
                prop_assert_eq!(attack_sources(&sources), attack_sources(&sources));
                prop_assert_eq!(alert_trend(&history), alert_trend(&history));
                prop_assert_eq!(threat_gauge(level), threat_gauge(level));
            }

            #[test]
            fn radar_network_axis_is_scaled(perf in arb_perf()) {
                let radar = system_performance(&perf);
                prop_assert_eq!(radar.series.data.len(), radar.indicators.len());
                prop_assert!((radar.series.data[2] - perf.network_traffic / NETWORK_SCALE).abs() < 1e-9);
            }

            #[test]
            fn categorical_panels_keep_every_entry(types in arb_counts()) {
                let pie = alert_types(&types);
                let bar = attack_sources(&types);
                prop_assert_eq!(pie.slices.len(), types.len());
                prop_assert_eq!(bar.categories.len(), bar.series.data.len());
            }

            #[test]
            fn gauge_stays_within_a_twentieth(level in 0.0..100.0f64) {
                prop_assert!((threat_gauge(level).value - level).abs() <= 0.05 + 1e-9);
            }
        }
    }
}
