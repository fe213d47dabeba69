use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseworkService;
use crate::models::{ApiResponse, ErrorCode, courseworks::responses::AvailableCoursework};
use crate::services::error_response;

pub async fn get_coursework(
    service: &CourseworkService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_coursework_with_enrollment_count(id).await {
        Ok(Some((coursework, enrolled))) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            AvailableCoursework::new(coursework, enrolled),
            "Coursework retrieved successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::CourseworkNotFound,
            "Coursework not found",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
