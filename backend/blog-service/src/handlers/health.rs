/// Liveness, metrics and the not-found fallback
use crate::error::{AppError, Result};
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    storage: &'static str,
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let (status, storage) = match state.repo.ping().await {
        Ok(()) => ("ok", "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            ("degraded", "unavailable")
        }
    };

    let body = HealthResponse {
        status,
        service: "blog-service",
        version: env!("CARGO_PKG_VERSION"),
        storage,
    };
    if status == "ok" {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

/// Prometheus text exposition of the default registry
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

/// Default service: every unknown URL
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse> {
    Err(AppError::not_found(req.path().to_string()))
}
