use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Local, Utc};
use opentelemetry::metrics::{Counter, MeterProvider};
use opentelemetry::KeyValue;
use opentelemetry_prometheus::exporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use serde_json::{json, Value};
use stationwx_core::{
    aggregate, load_records, stats, summarize, LoadedRecords, Period, RecordSource,
};

pub struct AppState {
    ready: AtomicBool,
    registry: Registry,
    #[allow(dead_code)]
    provider: SdkMeterProvider,
    requests_total: Counter<u64>,
    source: Option<Arc<dyn RecordSource>>,
    fallback_days: usize,
}

impl AppState {
    fn count(&self, route: &'static str) {
        self.requests_total.add(1, &[KeyValue::new("route", route)]);
    }

    async fn records(&self) -> LoadedRecords {
        load_records(self.source.as_deref(), Utc::now(), self.fallback_days).await
    }
}

/// Build the router around an optional live source.
///
/// Without a source every data endpoint serves `fallback_days` of synthetic
/// history.
pub fn build_app(
    source: Option<Arc<dyn RecordSource>>,
    fallback_days: usize,
) -> Result<(Router, Arc<AppState>)> {
    // Prometheus exporter via OpenTelemetry
    let registry = Registry::new();
    let reader = exporter()
        .with_registry(registry.clone())
        .build()
        .context("failed to build prometheus exporter")?;
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    let meter = provider.meter("stationwx-api");

    let requests_total = meter
        .u64_counter("stationwx_requests_total")
        .with_description("Total HTTP requests served")
        .init();

    let state = Arc::new(AppState {
        ready: AtomicBool::new(false),
        registry,
        provider,
        requests_total,
        source,
        fallback_days,
    });

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/weather-data", get(weather_data))
        .route("/api/weather-chart-data", get(chart_data))
        .route("/api/weather-chart-data/:period", get(chart_data_by_period))
        .route("/api/weather-summary", get(weather_summary))
        .route("/api/data-sources", get(data_sources))
        .route("/api/data", get(raw_data))
        .route("/api/real-time", get(real_time))
        .with_state(Arc::clone(&state));

    Ok((router, state))
}

pub fn set_ready(state: &Arc<AppState>, is_ready: bool) {
    state.ready.store(is_ready, Ordering::Relaxed);
}

fn local_label(instant: DateTime<Utc>, format: &str) -> String {
    instant.with_timezone(&Local).format(format).to_string()
}

fn failure(status: StatusCode, error: impl std::fmt::Display) -> Response {
    tracing::error!(%error, "request failed");
    (
        status,
        Json(json!({"success": false, "error": error.to_string()})),
    )
        .into_response()
}

async fn healthz(State(state): State<Arc<AppState>>) -> StatusCode {
    state.count("healthz");
    StatusCode::OK
}

async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(
    State(state): State<Arc<AppState>>,
) -> (
    [(axum::http::header::HeaderName, axum::http::HeaderValue); 1],
    String,
) {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::warn!(error=?e, "failed to encode metrics");
    }
    let body = String::from_utf8(buf).unwrap_or_default();
    let header = (
        header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    ([header], body)
}

async fn weather_data(State(state): State<Arc<AppState>>) -> Response {
    state.count("weather-data");
    let loaded = state.records().await;

    let stats = match stats(&loaded.records) {
        Ok(stats) => stats,
        Err(e) => return failure(StatusCode::INTERNAL_SERVER_ERROR, e),
    };

    tracing::info!(
        count = loaded.records.len(),
        source = loaded.provenance.tag(),
        "weather data served"
    );
    let body = json!({
        "success": true,
        "data": loaded.records,
        "stats": {
            "total_records": stats.total_records,
            "latest_temperature": stats.latest_temperature,
            "latest_humidity": stats.latest_humidity,
            "latest_pressure": stats.latest_pressure,
            "avg_temperature": stats.avg_temperature,
            "avg_humidity": stats.avg_humidity,
            "max_temperature": stats.max_temperature,
            "min_temperature": stats.min_temperature,
            "last_update": local_label(stats.last_update, "%Y-%m-%d %I:%M:%S %p"),
        },
        "count": loaded.records.len(),
        "source": loaded.provenance,
    });
    (StatusCode::OK, Json(body)).into_response()
}

async fn chart(state: &AppState, period_name: &str) -> Response {
    let loaded = state.records().await;
    let period = Period::from(period_name);
    let series = aggregate(&loaded.records, period, Utc::now());

    tracing::info!(
        points = series.len(),
        period = period.as_str(),
        source = loaded.provenance.tag(),
        "chart data served"
    );
    let body = json!({
        "success": true,
        "data": series,
        "source": loaded.provenance,
        "period": period_name,
    });
    (StatusCode::OK, Json(body)).into_response()
}

async fn chart_data(State(state): State<Arc<AppState>>) -> Response {
    state.count("weather-chart-data");
    chart(&state, Period::Latest.as_str()).await
}

async fn chart_data_by_period(
    State(state): State<Arc<AppState>>,
    Path(period): Path<String>,
) -> Response {
    state.count("weather-chart-data");
    chart(&state, &period).await
}

async fn weather_summary(State(state): State<Arc<AppState>>) -> Response {
    state.count("weather-summary");
    let loaded = state.records().await;

    let summary = match summarize(&loaded.records) {
        Ok(summary) => summary,
        Err(e) => return failure(StatusCode::INTERNAL_SERVER_ERROR, e),
    };

    let body = json!({
        "success": true,
        "summary": {
            "current_temp": summary.current_temperature,
            "current_humidity": summary.current_humidity,
            "current_pressure": summary.current_pressure,
            "today_high": summary.high_temperature,
            "today_low": summary.low_temperature,
            "today_avg_temp": summary.avg_temperature,
            "today_avg_humidity": summary.avg_humidity,
            "wind_speed": summary.sustain_wind_speed,
            "wind_direction": summary.sustain_wind_direction,
            "rain_today": summary.rain_total,
            "gust_wind_speed": summary.gust_wind_speed,
            "gust_wind_direction": summary.gust_wind_direction,
            "sustain_wind_direction": summary.sustain_wind_direction,
            "last_update": local_label(summary.last_update, "%I:%M:%S %p"),
        },
        "source": loaded.provenance,
    });
    (StatusCode::OK, Json(body)).into_response()
}

async fn data_sources(State(state): State<Arc<AppState>>) -> Response {
    state.count("data-sources");
    let body = json!({
        "success": true,
        "sources": {
            "firebase": state
                .source
                .as_ref()
                .is_some_and(|source| source.name() == "firebase"),
            "default": true,
        },
    });
    (StatusCode::OK, Json(body)).into_response()
}

async fn fetch_tree(state: &AppState) -> Result<Value, Response> {
    let Some(source) = state.source.as_ref() else {
        return Err(failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Firebase not configured",
        ));
    };
    source
        .fetch_tree()
        .await
        .map_err(|e| failure(StatusCode::INTERNAL_SERVER_ERROR, e))
}

async fn raw_data(State(state): State<Arc<AppState>>) -> Response {
    state.count("data");
    match fetch_tree(&state).await {
        Ok(data) => {
            let count = data.as_array().map(Vec::len).unwrap_or(1);
            let body = json!({"success": true, "data": data, "count": count});
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(resp) => resp,
    }
}

async fn real_time(State(state): State<Arc<AppState>>) -> Response {
    state.count("real-time");
    match fetch_tree(&state).await {
        Ok(data) => (StatusCode::OK, Json(json!({"success": true, "data": data}))).into_response(),
        Err(resp) => resp,
    }
}
