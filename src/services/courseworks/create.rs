use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{CourseworkService, ensure_subject_exists};
use crate::errors::CourseforgeError;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode, courseworks::requests::CreateCourseworkRequest};
use crate::services::{current_user, error_response};
use crate::storage::Storage;
use crate::utils::validate::validate_create_coursework;

// 教师只能给自己建课题；管理员须指定一名教师
async fn resolve_teacher(
    storage: &dyn Storage,
    user: &User,
    requested: Option<i64>,
) -> Result<i64, CourseforgeError> {
    if user.is_teacher() {
        return match requested {
            Some(id) if id != user.id => Err(CourseforgeError::authorization(
                "Teachers can only create their own courseworks",
            )),
            _ => Ok(user.id),
        };
    }

    let teacher_id =
        requested.ok_or_else(|| CourseforgeError::validation("teacher_id is required"))?;
    match storage.get_user_by_id(teacher_id).await? {
        Some(teacher) if teacher.is_teacher() => Ok(teacher.id),
        Some(_) => Err(CourseforgeError::validation(format!(
            "User {teacher_id} is not a teacher"
        ))),
        None => Err(CourseforgeError::not_found(format!(
            "Teacher {teacher_id} not found"
        ))),
    }
}

pub async fn create_coursework(
    service: &CourseworkService,
    body: CreateCourseworkRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_create_coursework(&body) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::CourseworkInvalid, msg)));
    }

    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    let teacher_id = match resolve_teacher(storage.as_ref(), &user, body.teacher_id).await {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };
    if let Err(e) = ensure_subject_exists(storage.as_ref(), body.subject_id).await {
        return Ok(error_response(&e));
    }

    match storage.create_coursework(teacher_id, body).await {
        Ok(coursework) => {
            info!(
                "Coursework {} created for teacher {} (capacity {})",
                coursework.id, teacher_id, coursework.max_students
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(coursework, "Coursework created")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
