use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One complete read of the analysis service's health. Each poll replaces
/// the previous snapshot entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub overall_status: String,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    pub system_metrics: SystemMetrics,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceHealth>,
    pub analytics: Analytics,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Critical,
    Warning,
    #[serde(other)]
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_usage_percent: f64,
    pub memory_usage_percent: f64,
    pub memory_used_gb: f64,
    pub memory_total_gb: f64,
    pub disk_usage_percent: f64,
    pub disk_used_gb: f64,
    pub disk_total_gb: f64,
    pub uptime_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    pub healthy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub analyses_today: u64,
    pub total_analyses: u64,
}

/// Three-way reading of a free-form status string. Drives display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSeverity {
    Healthy,
    Warning,
    Error,
}

impl StatusSeverity {
    pub fn classify(status: &str) -> Self {
        if status == "healthy" || status == "Connected" {
            StatusSeverity::Healthy
        } else if status.contains("Error") {
            StatusSeverity::Error
        } else {
            StatusSeverity::Warning
        }
    }
}

/// Outcome of the analyzer connectivity probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub status: ProbeStatus,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(skip_deserializing, default = "Utc::now")]
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Success,
    #[serde(other)]
    Error,
}

impl ProbeReport {
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Error,
            response: None,
            error: Some(detail.into()),
            checked_at: Utc::now(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == ProbeStatus::Success
    }
}
