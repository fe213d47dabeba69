use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{CourseworkService, ensure_subject_exists, load_owned};
use crate::models::{
    ApiResponse, ErrorCode,
    courseworks::requests::{SetAvailabilityRequest, UpdateCourseworkRequest},
};
use crate::services::{current_user, error_response};
use crate::utils::validate::validate_update_coursework;

pub async fn update_coursework(
    service: &CourseworkService,
    id: i64,
    body: UpdateCourseworkRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_update_coursework(&body) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::CourseworkInvalid, msg)));
    }

    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    if let Err(e) = load_owned(storage.as_ref(), &user, id).await {
        return Ok(error_response(&e));
    }
    if let Some(subject_id) = body.subject_id
        && let Err(e) = ensure_subject_exists(storage.as_ref(), subject_id).await
    {
        return Ok(error_response(&e));
    }

    // 名额低于当前人数时存储层返回 Conflict
    match storage.update_coursework(id, body).await {
        Ok(Some(coursework)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(coursework, "Coursework updated")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::CourseworkNotFound,
            "Coursework not found",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn set_availability(
    service: &CourseworkService,
    id: i64,
    body: SetAvailabilityRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    if let Err(e) = load_owned(storage.as_ref(), &user, id).await {
        return Ok(error_response(&e));
    }

    match storage.set_coursework_available(id, body.is_available).await {
        Ok(true) => {
            info!("Coursework {} availability set to {}", id, body.is_available);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Coursework availability updated")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::CourseworkNotFound,
            "Coursework not found",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
