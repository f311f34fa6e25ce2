use crate::models::analysis::{ExportFormat, RiskBucket};
use crate::models::view::ActiveView;
use crate::services::health::HealthDashboard;
use crate::services::staging::{InputMode, StagedFile};
use crate::services::workflow::{AnalysisView, WorkflowController};
use askama::Template;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};
use tracing::{debug, warn};

// Templates
#[derive(Template)]
#[template(path = "analysis.html")]
struct AnalysisTemplate {
    view: AnalysisView,
}

#[derive(Template)]
#[template(path = "health.html")]
struct HealthTemplate {
    view: HealthDashboard,
}

// State
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<WorkflowController>,
}

pub fn create_app(workflow: Arc<WorkflowController>, upload_limit_bytes: usize) -> Router {
    let reports = ServeDir::new(workflow.report_dir());
    let state = AppState { workflow };

    Router::new()
        .route("/", get(root))
        .route("/analysis", get(analysis_page))
        .route("/analysis/mode/:mode", post(select_mode))
        .route(
            "/analysis/file",
            post(stage_file).layer(DefaultBodyLimit::max(upload_limit_bytes)),
        )
        .route("/analysis/raw", post(stage_raw_text))
        .route("/analysis/sample", post(load_sample))
        .route("/analysis/samples/reload", post(reload_samples))
        .route("/analysis/samples/:filename", post(load_named_sample))
        .route("/analysis/submit", post(submit_analysis))
        .route("/analysis/entries/:bucket/:index/toggle", post(toggle_detail))
        .route("/analysis/export/:format", post(export_analysis))
        .route("/analysis/reset", post(reset_analysis))
        .route("/health", get(health_page))
        .route("/health/refresh", post(refresh_health))
        .route("/health/probe", post(probe_analyzer))
        .route("/api/state", get(api_state))
        .route("/api/health", get(api_health))
        .nest_service("/reports", reports)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}

fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        warn!("Template render failed: {}", e);
        "Template error".to_string()
    }))
}

fn back_to_analysis() -> Response {
    Redirect::to("/analysis").into_response()
}

fn back_to_health() -> Response {
    Redirect::to("/health").into_response()
}

// Routes
async fn root() -> impl IntoResponse {
    Redirect::to("/analysis")
}

async fn analysis_page(State(state): State<AppState>) -> impl IntoResponse {
    state.workflow.select_view(ActiveView::Analysis);
    render(&AnalysisTemplate {
        view: state.workflow.analysis_view(),
    })
}

async fn health_page(State(state): State<AppState>) -> impl IntoResponse {
    state.workflow.select_view(ActiveView::Health);
    render(&HealthTemplate {
        view: state.workflow.health_view(),
    })
}

async fn select_mode(State(state): State<AppState>, Path(mode): Path<String>) -> Response {
    match InputMode::from_str_value(&mode) {
        Some(mode) => {
            state.workflow.select_mode(mode);
            back_to_analysis()
        }
        None => (StatusCode::NOT_FOUND, "Unknown input mode").into_response(),
    }
}

async fn stage_file(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed upload: {}", e);
                state.workflow.report_error(format!("Error reading upload: {}", e));
                break;
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or("text/csv").to_string();
        if name.is_empty() {
            debug!("Upload submitted without a file");
            break;
        }
        match field.bytes().await {
            Ok(bytes) => state
                .workflow
                .stage_file(StagedFile::new(name, content_type, bytes.to_vec())),
            Err(e) => {
                warn!("Failed to read uploaded file {}: {}", name, e);
                state.workflow.report_error(format!("Error reading upload: {}", e));
            }
        }
        break;
    }
    back_to_analysis()
}

#[derive(Deserialize)]
struct RawLogsForm {
    #[serde(default)]
    raw_logs: String,
}

async fn stage_raw_text(State(state): State<AppState>, Form(form): Form<RawLogsForm>) -> Response {
    state.workflow.stage_raw_text(form.raw_logs);
    back_to_analysis()
}

async fn load_sample(State(state): State<AppState>) -> Response {
    state.workflow.load_sample();
    back_to_analysis()
}

async fn load_named_sample(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    // Failures are already in the view's error slot.
    let _ = state.workflow.load_named_sample(filename).await;
    back_to_analysis()
}

async fn reload_samples(State(state): State<AppState>) -> Response {
    let _ = state.workflow.reload_samples().await;
    back_to_analysis()
}

async fn submit_analysis(State(state): State<AppState>) -> Response {
    if let Err(e) = state.workflow.submit_analysis().await {
        debug!("Submission did not complete: {}", e);
    }
    back_to_analysis()
}

async fn toggle_detail(
    State(state): State<AppState>,
    Path((bucket, index)): Path<(String, usize)>,
) -> Response {
    let Some(bucket) = RiskBucket::from_str_value(&bucket) else {
        return (StatusCode::NOT_FOUND, "Unknown risk bucket").into_response();
    };
    match state.workflow.toggle_detail(bucket, index) {
        Some(_) => back_to_analysis(),
        None => (StatusCode::NOT_FOUND, "No such entry").into_response(),
    }
}

async fn export_analysis(State(state): State<AppState>, Path(format): Path<String>) -> Response {
    let Some(format) = ExportFormat::from_path_segment(&format) else {
        return (StatusCode::NOT_FOUND, "Unknown export format").into_response();
    };
    let _ = state.workflow.export(format).await;
    back_to_analysis()
}

async fn reset_analysis(State(state): State<AppState>) -> Response {
    state.workflow.reset_analysis();
    back_to_analysis()
}

async fn refresh_health(State(state): State<AppState>) -> Response {
    let _ = state.workflow.refresh_health().await;
    back_to_health()
}

async fn probe_analyzer(State(state): State<AppState>) -> Response {
    let _ = state.workflow.probe_analyzer().await;
    back_to_health()
}

async fn api_state(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "active_view": state.workflow.active_view(),
        "analysis": state.workflow.analysis_view(),
    }))
}

async fn api_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.workflow.health_view())
}
