use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use tracing::warn;

use super::SystemService;
use crate::models::{ApiResponse, AppStartTime, ErrorCode, system::responses::HealthResponse};

pub async fn health(service: &SystemService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let config = service.get_config();
    let storage = service.get_storage(request)?;

    let database = match storage.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check: database unreachable: {}", e);
            false
        }
    };

    let started_at = request
        .app_data::<web::Data<AppStartTime>>()
        .map(|t| t.start_datetime)
        .unwrap_or_else(chrono::Utc::now);

    let body = HealthResponse {
        system_name: config.app.system_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: config.app.environment.clone(),
        database,
        started_at,
        uptime_seconds: chrono::Utc::now()
            .signed_duration_since(started_at)
            .num_seconds(),
    };

    if database {
        Ok(HttpResponse::Ok().json(ApiResponse::success(body, "Service is healthy")))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(ApiResponse::error(
            ErrorCode::InternalServerError,
            body,
            "Database is unreachable",
        )))
    }
}
