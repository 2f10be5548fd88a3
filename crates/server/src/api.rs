//! HTTP API for probes, traffic control and failure injection

use crate::config::AppConfig;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tester_lib::{
    CpuBurster, HealthState, LoadJob, MarkerVolume, MemoryAccumulator, ProbeReport,
    ProbeReporter, StructuredLogger, TrafficController,
};
use tokio::net::TcpListener;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub health: HealthState,
    pub probes: ProbeReporter,
    pub traffic: TrafficController,
    pub memory: MemoryAccumulator,
    pub cpu: CpuBurster,
    pub pv_volume: MarkerVolume,
    pub pod_volume: MarkerVolume,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(config: AppConfig, health: HealthState, logger: StructuredLogger) -> Self {
        Self {
            probes: ProbeReporter::new(health.clone(), logger.clone()),
            traffic: TrafficController::new(health.clone(), logger.clone()),
            memory: MemoryAccumulator::new(health.clone(), logger.clone()),
            cpu: CpuBurster::new(logger.clone()),
            pv_volume: MarkerVolume::new(&config.path_persistent, logger.clone()),
            pod_volume: MarkerVolume::new(&config.path_pod, logger.clone()),
            config,
            health,
            logger,
        }
    }

    pub fn with_memory(mut self, memory: MemoryAccumulator) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_cpu(mut self, cpu: CpuBurster) -> Self {
        self.cpu = cpu;
        self
    }
}

fn flag_response(up: bool) -> Response {
    if up {
        "ok".into_response()
    } else {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

fn probe_response(report: ProbeReport) -> Response {
    match report.body {
        Some(body) => Html(body).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn hello() -> &'static str {
    "Welcome to Kubernetes Another Class"
}

async fn hostname(State(state): State<Arc<AppState>>) -> String {
    state.logger.host().to_string()
}

async fn version(State(state): State<Arc<AppState>>) -> String {
    format!("[App Version] : {}", state.config.version)
}

/// Plain readiness check - 200 "ok" if ready, 500 otherwise
async fn ready(State(state): State<Arc<AppState>>) -> Response {
    flag_response(state.health.is_ready())
}

/// Plain liveness check - 200 "ok" if live, 500 otherwise
async fn liveness(State(state): State<Arc<AppState>>) -> Response {
    flag_response(state.health.is_live())
}

async fn startup(State(state): State<Arc<AppState>>) -> Response {
    probe_response(state.probes.report_startup())
}

async fn readiness(State(state): State<Arc<AppState>>) -> Response {
    probe_response(state.probes.report_readiness())
}

async fn traffic_off(State(state): State<Arc<AppState>>) -> &'static str {
    state.traffic.traffic_off();
    "ok"
}

async fn traffic_on(State(state): State<Arc<AppState>>) -> &'static str {
    state.traffic.traffic_on();
    "ok"
}

async fn server_error(State(state): State<Arc<AppState>>) -> &'static str {
    state.traffic.inject_fault();
    "ok"
}

async fn memory_leak(State(state): State<Arc<AppState>>) -> &'static str {
    // Detached: the task outlives the request
    drop(state.memory.trigger());
    "Memory leak started..."
}

#[derive(Debug, Deserialize)]
pub struct CpuLoadParams {
    min: Option<String>,
    thread: Option<String>,
}

async fn cpu_load(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CpuLoadParams>,
) -> String {
    let job = LoadJob::from_params(params.min.as_deref(), params.thread.as_deref());
    // Workers are detached when the handles drop
    drop(state.cpu.launch(&job));
    format!("CPU Load started ({})", job.summary())
}

async fn app_info(State(state): State<Arc<AppState>>) -> Html<String> {
    let config = &state.config;
    let datasource = &config.datasource;

    Html(format!(
        "<b>[Version] :</b> {}<br>\
         <b>[Profile] :</b> {}<br>\
         <b>[Role] :</b> {} (option: ALL, GET, POST, PUT, DELETE)<br>\
         <b>[Database]</b><br>\
         driver-class-name : {}<br>\
         url : {}<br>\
         username : {}<br>\
         password : {}",
        config.version,
        config.profile,
        config.role,
        datasource.driver_class_name,
        datasource.url,
        datasource.username,
        datasource.password,
    ))
}

async fn properties(State(state): State<Arc<AppState>>) -> Html<String> {
    let config = &state.config;

    Html(format!(
        "<b>[Application profile] : </b> {}<br>\
         <b>Volume path :</b> {}<br><br>\
         <b>application.yaml :</b> Common properties<br>---<br>\
         datasource:<br>&nbsp;&nbsp;driver-class-name:<br>&nbsp;&nbsp;url:<br>&nbsp;&nbsp;username:<br>&nbsp;&nbsp;password:<br>\
         application:<br>&nbsp;&nbsp;role:&nbsp;\"ALL\"<br>&nbsp;&nbsp;version:&nbsp;\"Api Tester v1.0.0\"<br><br>\
         postgresql:<br>&nbsp;&nbsp;filepath:<br><br>\
         <b>Current Config:</b><br>\
         PV Path: {}<br>Pod Path: {}",
        config.profile, config.path_persistent, config.path_persistent, config.path_pod,
    ))
}

async fn create_file_pv(State(state): State<Arc<AppState>>) -> String {
    state.pv_volume.create_marker().await
}

async fn list_file_pv(State(state): State<Arc<AppState>>) -> String {
    state.pv_volume.listing().await
}

async fn create_file_pod(State(state): State<Arc<AppState>>) -> String {
    state.pod_volume.create_marker().await
}

async fn list_file_pod(State(state): State<Arc<AppState>>) -> String {
    state.pod_volume.listing().await
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/hello", get(hello))
        .route("/hostname", get(hostname))
        .route("/version", get(version))
        .route("/ready", get(ready))
        .route("/liveness", get(liveness))
        .route("/startup", get(startup))
        .route("/readiness", get(readiness))
        .route("/traffic-off", get(traffic_off))
        .route("/traffic-on", get(traffic_on))
        .route("/server-error", get(server_error))
        .route("/memory-leak", get(memory_leak))
        .route("/cpu-load", get(cpu_load))
        .route("/info", get(app_info))
        .route("/properties", get(properties))
        .route("/create-file-pv", get(create_file_pv))
        .route("/list-file-pv", get(list_file_pv))
        .route("/create-file-pod", get(create_file_pod))
        .route("/list-file-pod", get(list_file_pod))
        .with_state(state)
}

/// Bind the API listener; failure here is fatal for the process
pub async fn bind(port: u16) -> anyhow::Result<TcpListener> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "API listener bound");
    Ok(listener)
}

/// Serve the API on an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
