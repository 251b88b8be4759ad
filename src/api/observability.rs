use crate::api::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span};

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Per-request span, counters and latency histogram. Metrics are labeled by
/// the matched route template, not the raw URI, so ids in paths do not blow
/// up the label cardinality.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let started = Instant::now();

    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| req.uri().path().to_string(), |m| m.as_str().to_string());

    let span = info_span!(
        "request",
        method = %method,
        route = %route,
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;
        let status = response.status();

        let labels = [
            ("method", method),
            ("route", route),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("edhub_http_requests_total", &labels).increment(1);
        metrics::histogram!("edhub_http_request_duration_seconds", &labels)
            .record(started.elapsed().as_secs_f64());

        // Auth refusals are routine here and worth their own series.
        if status == axum::http::StatusCode::UNAUTHORIZED {
            metrics::counter!("edhub_auth_refusals_total").increment(1);
        }

        info!(
            status = status.as_u16(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request finished"
        );

        response
    }
    .instrument(span)
    .await
}
