//! The composite metrics payload served by `GET /dashboard-data`.
//!
//! The five sub-objects each panel needs are required; a payload missing any
//! of them fails to decode and the cycle is reported as a malformed response.
//! Fields no panel draws are defaulted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One complete fetch of dashboard metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Server-side generation time, as formatted by the server.
    #[serde(default)]
    pub timestamp: String,
    /// Daily alert history, oldest first.
    pub historical_data: Vec<HistoricalPoint>,
    /// Threat intelligence summary.
    pub threat_intelligence: ThreatIntelligence,
    /// Current security alerts.
    pub security_alerts: SecurityAlerts,
    /// Host resource usage.
    pub system_performance: SystemPerformance,
}

/// One day of alert history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    /// Day, `YYYY-MM-DD`.
    pub date: String,
    /// Alerts raised that day.
    pub alert_count: i64,
    /// High-severity alerts raised that day.
    pub high_severity: i64,
    /// Threat level that day.
    #[serde(default)]
    pub threat_level: f64,
}

/// Threat intelligence summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreatIntelligence {
    /// Overall threat index, 0–100.
    pub threat_level: f64,
    /// Attack counts by source region.
    pub attack_sources: BTreeMap<String, i64>,
    /// Recently observed threat campaigns.
    #[serde(default)]
    pub emerging_threats: Vec<EmergingThreat>,
}

/// A recently observed threat campaign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergingThreat {
    /// Threat category.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Severity label.
    #[serde(default)]
    pub severity: String,
    /// Day first seen, `YYYY-MM-DD`.
    #[serde(default)]
    pub first_observed: String,
    /// Trend label.
    #[serde(default)]
    pub trend: String,
}

/// Current security alerts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityAlerts {
    /// Total alerts in the current window.
    #[serde(default)]
    pub total_alerts: i64,
    /// Alert counts by type.
    pub alert_types: BTreeMap<String, i64>,
    /// Alert counts by severity.
    #[serde(default)]
    pub severity_distribution: BTreeMap<String, i64>,
}

/// Host resource usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemPerformance {
    /// CPU usage, percent.
    pub cpu_usage: f64,
    /// Memory usage, percent.
    pub memory_usage: f64,
    /// Network throughput, Mbps.
    pub network_traffic: f64,
    /// Disk throughput, MB/s.
    pub disk_io: f64,
}

/// A realistic payload for tests.
#[cfg(test)]
pub(crate) fn sample_payload() -> serde_json::Value {
    serde_json::json!({
        "timestamp": "2024-05-01 12:00:00",
        "historical_data": [
            { "date": "2024-04-30", "alert_count": 120, "threat_level": 41.2, "high_severity": 20 },
            { "date": "2024-05-01", "alert_count": 95, "threat_level": 38.0, "high_severity": 14 }
        ],
        "threat_intelligence": {
            "threat_level": 47.26,
            "attack_sources": { "Asia": 40, "Europe": 25, "North America": 30, "Other": 5 },
            "emerging_threats": [
                { "type": "Ransomware", "severity": "high", "first_observed": "2024-04-12", "trend": "rising" }
            ]
        },
        "security_alerts": {
            "total_alerts": 95,
            "alert_types": { "Intrusion": 30, "Malware": 20, "Anomalous Access": 40, "Other": 5 },
            "severity_distribution": { "high": 14, "medium": 40, "low": 41 }
        },
        "system_performance": {
            "cpu_usage": 55.5, "memory_usage": 61.0, "network_traffic": 250.0, "disk_io": 30.0
        }
    })
}
