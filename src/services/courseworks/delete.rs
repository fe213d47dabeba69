use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{CourseworkService, load_owned};
use crate::errors::CourseforgeError;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, error_response};

pub async fn delete_coursework(
    service: &CourseworkService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    if let Err(e) = load_owned(storage.as_ref(), &user, id).await {
        return Ok(error_response(&e));
    }

    match storage.delete_coursework(id).await {
        Ok(true) => {
            info!("Coursework {} deleted by user {}", id, user.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Coursework deleted")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::CourseworkNotFound,
            "Coursework not found",
        ))),
        // 仍有学生选题
        Err(CourseforgeError::Conflict(msg)) => Ok(HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::CourseworkInUse, msg))),
        Err(e) => Ok(error_response(&e)),
    }
}
