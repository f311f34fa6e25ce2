use crate::error::WorkflowError;
use crate::models::health::{
    AlertType, Analytics, HealthSnapshot, ProbeReport, StatusSeverity, SystemMetrics,
};
use crate::models::view::Accent;
use crate::services::analyzer::AnalyzerApi;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub fn severity_accent(severity: StatusSeverity) -> Accent {
    match severity {
        StatusSeverity::Healthy => Accent::Safe,
        StatusSeverity::Warning => Accent::Warning,
        StatusSeverity::Error => Accent::Critical,
    }
}

pub fn status_accent(status: &str) -> Accent {
    severity_accent(StatusSeverity::classify(status))
}

pub fn alert_accent(alert_type: AlertType) -> Accent {
    match alert_type {
        AlertType::Critical => Accent::Critical,
        AlertType::Warning => Accent::Warning,
        AlertType::Info => Accent::Info,
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PollStatus {
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertRow {
    pub accent: Accent,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceRow {
    pub name: String,
    pub status: String,
    pub healthy: bool,
    pub accent: Accent,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotView {
    pub overall_status: String,
    pub overall_accent: Accent,
    pub alerts: Vec<AlertRow>,
    pub metrics: SystemMetrics,
    pub services: Vec<ServiceRow>,
    pub analytics: Analytics,
    pub timestamp: String,
}

impl SnapshotView {
    pub fn of(snapshot: &HealthSnapshot) -> Self {
        Self {
            overall_status: snapshot.overall_status.clone(),
            overall_accent: status_accent(&snapshot.overall_status),
            alerts: snapshot
                .alerts
                .iter()
                .map(|alert| AlertRow {
                    accent: alert_accent(alert.alert_type),
                    message: alert.message.clone(),
                })
                .collect(),
            metrics: snapshot.system_metrics.clone(),
            services: snapshot
                .services
                .iter()
                .map(|(name, service)| ServiceRow {
                    name: name.clone(),
                    status: service.status.clone(),
                    healthy: service.healthy,
                    accent: status_accent(&service.status),
                })
                .collect(),
            analytics: snapshot.analytics.clone(),
            timestamp: snapshot.timestamp.clone(),
        }
    }
}

/// What the health view renders: the last good snapshot, how polling is
/// going, and the latest probe.
#[derive(Debug, Clone, Serialize)]
pub struct HealthDashboard {
    pub snapshot: Option<SnapshotView>,
    pub poll: PollStatus,
    pub probe: Option<ProbeReport>,
}

/// Keeps the latest health snapshot of the analysis service.
///
/// A failed poll never clears what is displayed; the previous snapshot stays
/// until a later poll succeeds.
#[derive(Default)]
pub struct HealthPoller {
    snapshot: RwLock<Option<Arc<HealthSnapshot>>>,
    status: RwLock<PollStatus>,
    probe: RwLock<Option<ProbeReport>>,
}

impl HealthPoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<Arc<HealthSnapshot>> {
        self.snapshot.read().clone()
    }

    pub fn poll_status(&self) -> PollStatus {
        self.status.read().clone()
    }

    pub fn probe_report(&self) -> Option<ProbeReport> {
        self.probe.read().clone()
    }

    pub fn dashboard(&self) -> HealthDashboard {
        HealthDashboard {
            snapshot: self.snapshot().as_deref().map(SnapshotView::of),
            poll: self.poll_status(),
            probe: self.probe_report(),
        }
    }

    /// One fetch. Also serves as the manual refresh; the interval is untouched.
    pub async fn refresh(&self, api: &dyn AnalyzerApi) -> Result<(), WorkflowError> {
        match api.fetch_health().await {
            Ok(snapshot) => {
                debug!("Health snapshot received: {}", snapshot.overall_status);
                *self.snapshot.write() = Some(Arc::new(snapshot));
                let mut status = self.status.write();
                status.last_success_at = Some(Utc::now());
                status.last_error = None;
                status.consecutive_failures = 0;
                Ok(())
            }
            Err(e) => {
                warn!("Health poll failed: {}", e);
                let mut status = self.status.write();
                status.last_error = Some(e.to_string());
                status.consecutive_failures += 1;
                Err(e)
            }
        }
    }

    pub async fn probe(&self, api: &dyn AnalyzerApi) -> ProbeReport {
        let report = match api.probe_analyzer().await {
            Ok(report) => report,
            Err(e) => {
                warn!("Analyzer probe failed: {}", e);
                ProbeReport::failed(e.to_string())
            }
        };
        *self.probe.write() = Some(report.clone());
        report
    }

    /// Starts the recurring poll: one fetch right away, then one per `period`.
    pub fn spawn(self: &Arc<Self>, api: Arc<dyn AnalyzerApi>, period: Duration) -> PollerTask {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let poller = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {
                        // A fetch in flight must not hold up shutdown.
                        tokio::select! {
                            _ = &mut shutdown_rx => break,
                            // Failures are recorded in the poll status.
                            _ = poller.refresh(api.as_ref()) => {}
                        }
                    }
                }
            }
            debug!("Health poll loop exited");
        });

        info!("Health polling every {:?}", period);
        PollerTask {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

/// Handle to the recurring poll. Dropping it without `stop` aborts the loop.
pub struct PollerTask {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PollerTask {
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Health poll task ended abnormally: {}", e);
            }
        }
        info!("Health polling stopped");
    }
}

impl Drop for PollerTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::health::ProbeStatus;
    use crate::services::analyzer::MockAnalyzerApi;
    use crate::services::fixtures::{health_snapshot, Gate, StubAnalyzer};

    #[test]
    fn test_alert_accents() {
        assert_eq!(alert_accent(AlertType::Critical), Accent::Critical);
        assert_eq!(alert_accent(AlertType::Warning), Accent::Warning);
        assert_eq!(alert_accent(AlertType::Info), Accent::Info);
    }

    #[test]
    fn test_status_accents() {
        assert_eq!(status_accent("healthy"), Accent::Safe);
        assert_eq!(status_accent("Connected"), Accent::Safe);
        assert_eq!(status_accent("Error: DB unreachable"), Accent::Critical);
        assert_eq!(status_accent("degraded"), Accent::Warning);
    }

    #[tokio::test]
    async fn test_successful_poll_replaces_snapshot() {
        let mut api = MockAnalyzerApi::new();
        let mut calls = 0;
        api.expect_fetch_health().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(health_snapshot("healthy", "Connected"))
            } else {
                Ok(health_snapshot("degraded", "Connected"))
            }
        });

        let poller = HealthPoller::new();
        poller.refresh(&api).await.unwrap();
        poller.refresh(&api).await.unwrap();

        assert_eq!(poller.snapshot().unwrap().overall_status, "degraded");
        assert!(poller.poll_status().last_success_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_poll_keeps_last_snapshot() {
        let mut api = MockAnalyzerApi::new();
        let mut calls = 0;
        api.expect_fetch_health().times(3).returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(health_snapshot("healthy", "Connected"))
            } else {
                Err(WorkflowError::Transport("connection refused".into()))
            }
        });

        let poller = HealthPoller::new();
        poller.refresh(&api).await.unwrap();
        assert!(poller.refresh(&api).await.is_err());
        assert!(poller.refresh(&api).await.is_err());

        let snapshot = poller.snapshot().expect("snapshot retained");
        assert_eq!(snapshot.overall_status, "healthy");
        let status = poller.poll_status();
        assert_eq!(status.consecutive_failures, 2);
        assert_eq!(status.last_error.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_error_status_scenario() {
        let mut api = MockAnalyzerApi::new();
        api.expect_fetch_health().returning(|| {
            Ok(health_snapshot(
                "Error: DB unreachable",
                "Error: connection refused",
            ))
        });

        let poller = HealthPoller::new();
        poller.refresh(&api).await.unwrap();
        let snapshot = poller.snapshot().unwrap();

        assert_eq!(
            StatusSeverity::classify(&snapshot.services["database"].status),
            StatusSeverity::Error
        );
        assert_eq!(status_accent(&snapshot.overall_status), Accent::Critical);

        let dashboard = poller.dashboard();
        let view = dashboard.snapshot.unwrap();
        assert_eq!(view.overall_accent, Accent::Critical);
        let accents: Vec<_> = view.services.iter().map(|s| (s.name.as_str(), s.accent)).collect();
        assert_eq!(
            accents,
            vec![("database", Accent::Critical), ("gemini_ai", Accent::Safe)]
        );
        assert_eq!(view.alerts[0].accent, Accent::Warning);
    }

    #[tokio::test]
    async fn test_probe_failure_is_recorded_as_error_report() {
        let mut api = MockAnalyzerApi::new();
        api.expect_probe_analyzer()
            .returning(|| Err(WorkflowError::http_status(502)));

        let poller = HealthPoller::new();
        let report = poller.probe(&api).await;

        assert_eq!(report.status, ProbeStatus::Error);
        assert_eq!(report.error.as_deref(), Some("HTTP error! status: 502"));
        assert!(poller.probe_report().is_some());
        assert!(poller.snapshot().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_loop_fetches_immediately_then_on_interval() {
        let stub = Arc::new(StubAnalyzer::new());
        let poller = Arc::new(HealthPoller::new());
        let api: Arc<dyn AnalyzerApi> = stub.clone();

        let task = poller.spawn(api, Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(stub.health_calls(), 1);
        assert!(poller.snapshot().is_some());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(stub.health_calls(), 3);

        task.stop().await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(stub.health_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_does_not_shift_interval() {
        let stub = Arc::new(StubAnalyzer::new());
        let poller = Arc::new(HealthPoller::new());
        let api: Arc<dyn AnalyzerApi> = stub.clone();

        let task = poller.spawn(Arc::clone(&api), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(10)).await;
        poller.refresh(api.as_ref()).await.unwrap();
        assert_eq!(stub.health_calls(), 2);

        // Next scheduled tick is still at t=30, not t=40.
        tokio::time::sleep(Duration::from_secs(21)).await;
        assert_eq!(stub.health_calls(), 3);

        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_task_stops_polling() {
        let stub = Arc::new(StubAnalyzer::new());
        let poller = Arc::new(HealthPoller::new());
        let api: Arc<dyn AnalyzerApi> = stub.clone();

        let task = poller.spawn(api, Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(task);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(stub.health_calls(), 1);
    }

    #[tokio::test]
    async fn test_stop_does_not_wait_for_fetch_in_flight() {
        let stub = Arc::new(StubAnalyzer::new());
        stub.hold(Gate::Health);
        let poller = Arc::new(HealthPoller::new());
        let api: Arc<dyn AnalyzerApi> = stub.clone();

        let task = poller.spawn(api, Duration::from_secs(30));
        while stub.health_calls() == 0 {
            tokio::task::yield_now().await;
        }

        let stopped = tokio::time::timeout(Duration::from_secs(2), task.stop()).await;
        assert!(stopped.is_ok());
        assert!(poller.snapshot().is_none());
    }
}
