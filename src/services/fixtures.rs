//! Builders and a controllable analyzer stub shared by the service tests.

use crate::error::WorkflowError;
use crate::models::analysis::{
    AnalysisResult, ExportFormat, LogEntry, LoginStatus, RiskLevel, RiskVerdict,
    SampleFileDescriptor,
};
use crate::models::health::{
    Alert, AlertType, Analytics, HealthSnapshot, ProbeReport, ProbeStatus, ServiceHealth,
    SystemMetrics,
};
use crate::services::analyzer::AnalyzerApi;
use crate::services::staging::StagedFile;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub fn verdict(username: &str, level: RiskLevel) -> RiskVerdict {
    RiskVerdict {
        entry: LogEntry {
            username: username.to_string(),
            ip_address: "192.168.1.100".to_string(),
            timestamp: "2024-01-15 09:15:23".to_string(),
            location: "New York".to_string(),
            device: "Chrome/Windows".to_string(),
            login_status: LoginStatus::Success,
        },
        risk_level: level,
        risk_factors: vec![format!("{} factor", level)],
        explanation: Some(format!("{} is rated {}", username, level)),
        log_index: None,
    }
}

pub fn analysis_result(id: &str, high: usize, medium: usize, low: usize) -> AnalysisResult {
    let bucket = |prefix: &str, level: RiskLevel, n: usize| {
        (0..n)
            .map(|i| verdict(&format!("{}_{}", prefix, i), level))
            .collect::<Vec<_>>()
    };
    let overall = if high > 0 {
        RiskLevel::High
    } else if medium > 0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    AnalysisResult {
        analysis_id: id.to_string(),
        overall_risk_score: overall,
        risk_summary: "Analysis completed".to_string(),
        recommendations: vec!["Enable multi-factor authentication".to_string()],
        high_risk_logs: bucket("high", RiskLevel::High, high),
        medium_risk_logs: bucket("medium", RiskLevel::Medium, medium),
        low_risk_logs: bucket("low", RiskLevel::Low, low),
    }
}

pub fn sample_descriptor(filename: &str, log_count: u64) -> SampleFileDescriptor {
    SampleFileDescriptor {
        filename: filename.to_string(),
        display_name: filename.trim_end_matches(".csv").replace('_', " "),
        log_count,
        size_bytes: log_count * 80,
    }
}

pub fn health_snapshot(overall_status: &str, database_status: &str) -> HealthSnapshot {
    let mut services = BTreeMap::new();
    services.insert(
        "database".to_string(),
        ServiceHealth {
            status: database_status.to_string(),
            healthy: database_status == "Connected",
        },
    );
    services.insert(
        "gemini_ai".to_string(),
        ServiceHealth {
            status: "Connected".to_string(),
            healthy: true,
        },
    );

    HealthSnapshot {
        overall_status: overall_status.to_string(),
        alerts: vec![Alert {
            alert_type: AlertType::Warning,
            message: "Disk usage above 80%".to_string(),
        }],
        system_metrics: SystemMetrics {
            cpu_usage_percent: 12.5,
            memory_usage_percent: 48.0,
            memory_used_gb: 3.8,
            memory_total_gb: 7.9,
            disk_usage_percent: 81.2,
            disk_used_gb: 40.6,
            disk_total_gb: 50.0,
            uptime_hours: 72.25,
        },
        services,
        analytics: Analytics {
            analyses_today: 4,
            total_analyses: 210,
        },
        timestamp: "2024-01-16T08:30:15Z".to_string(),
    }
}

/// Points at which the stub can hold a call until the test releases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    Submit,
    Export(ExportFormat),
    Health,
    Catalog,
}

/// Analyzer stand-in whose calls can be parked on a gate, used where a test
/// needs an operation to stay in flight.
pub struct StubAnalyzer {
    pub analysis: Mutex<Result<AnalysisResult, WorkflowError>>,
    pub health: Mutex<Result<HealthSnapshot, WorkflowError>>,
    pub exports: Mutex<HashMap<ExportFormat, Result<Vec<u8>, WorkflowError>>>,
    pub samples: Mutex<Result<String, WorkflowError>>,
    gates: Mutex<HashMap<Gate, Arc<Notify>>>,
    submit_calls: AtomicUsize,
    health_calls: AtomicUsize,
}

impl StubAnalyzer {
    pub fn new() -> Self {
        Self {
            analysis: Mutex::new(Ok(analysis_result("5f2c9e1a-77d0", 0, 0, 1))),
            health: Mutex::new(Ok(health_snapshot("healthy", "Connected"))),
            exports: Mutex::new(HashMap::new()),
            samples: Mutex::new(Ok(String::from("username,ip_address"))),
            gates: Mutex::new(HashMap::new()),
            submit_calls: AtomicUsize::new(0),
            health_calls: AtomicUsize::new(0),
        }
    }

    pub fn hold(&self, gate: Gate) {
        self.gates.lock().insert(gate, Arc::new(Notify::new()));
    }

    pub fn release(&self, gate: Gate) {
        if let Some(notify) = self.gates.lock().remove(&gate) {
            notify.notify_one();
        }
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    async fn pass(&self, gate: Gate) {
        let notify = self.gates.lock().get(&gate).cloned();
        if let Some(notify) = notify {
            notify.notified().await;
        }
    }
}

#[async_trait]
impl AnalyzerApi for StubAnalyzer {
    async fn submit_file(&self, _file: &StagedFile) -> Result<AnalysisResult, WorkflowError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.pass(Gate::Submit).await;
        self.analysis.lock().clone()
    }

    async fn submit_raw_text(&self, _raw_logs: &str) -> Result<AnalysisResult, WorkflowError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.pass(Gate::Submit).await;
        self.analysis.lock().clone()
    }

    async fn fetch_health(&self) -> Result<HealthSnapshot, WorkflowError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.pass(Gate::Health).await;
        self.health.lock().clone()
    }

    async fn fetch_sample_catalog(&self) -> Result<Vec<SampleFileDescriptor>, WorkflowError> {
        self.pass(Gate::Catalog).await;
        Ok(vec![sample_descriptor("brute_force_attack.csv", 25)])
    }

    async fn fetch_sample(&self, _filename: &str) -> Result<String, WorkflowError> {
        self.samples.lock().clone()
    }

    async fn export_analysis(
        &self,
        _analysis_id: &str,
        format: ExportFormat,
    ) -> Result<Vec<u8>, WorkflowError> {
        self.pass(Gate::Export(format)).await;
        self.exports
            .lock()
            .get(&format)
            .cloned()
            .unwrap_or_else(|| Ok(format!("{} report", format).into_bytes()))
    }

    async fn probe_analyzer(&self) -> Result<ProbeReport, WorkflowError> {
        Ok(ProbeReport {
            status: ProbeStatus::Success,
            response: Some("Gemini API is working correctly!".to_string()),
            error: None,
            checked_at: Utc::now(),
        })
    }
}
