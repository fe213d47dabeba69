use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::errors::CourseforgeError;
use crate::models::assignments::requests::{AssignRequest, CanAssignQuery};
use crate::models::users::entities::User;
use crate::models::ApiResponse;
use crate::services::{current_user, error_response};
use crate::storage::Storage;

// 选题对象：学生只能为自己选题，管理员须指定学生
async fn resolve_student(
    storage: &dyn Storage,
    user: &User,
    requested: Option<i64>,
) -> Result<i64, CourseforgeError> {
    if user.is_student() {
        return match requested {
            Some(id) if id != user.id => Err(CourseforgeError::authorization(
                "Students can only enroll themselves",
            )),
            _ => Ok(user.id),
        };
    }
    if !user.is_admin() {
        return Err(CourseforgeError::authorization(
            "Only students and administrators can enroll",
        ));
    }

    let student_id =
        requested.ok_or_else(|| CourseforgeError::validation("student_id is required"))?;
    match storage.get_user_by_id(student_id).await? {
        Some(target) if target.is_student() => Ok(target.id),
        Some(_) => Err(CourseforgeError::validation(format!(
            "User {student_id} is not a student"
        ))),
        None => Err(CourseforgeError::not_found(format!(
            "Student {student_id} not found"
        ))),
    }
}

pub async fn assign(
    service: &AssignmentService,
    coursework_id: i64,
    body: AssignRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    let workflow = service.workflow(request)?;

    let student_id = match resolve_student(storage.as_ref(), &user, body.student_id).await {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    match workflow.assign_student(student_id, coursework_id).await {
        Ok(detail) => Ok(HttpResponse::Created().json(ApiResponse::success(
            detail,
            "Student assigned to coursework",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn can_assign(
    service: &AssignmentService,
    coursework_id: i64,
    query: CanAssignQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    let workflow = service.workflow(request)?;

    let student_id = match resolve_student(storage.as_ref(), &user, query.student_id).await {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    match workflow.can_assign(student_id, coursework_id).await {
        Ok(verdict) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            verdict,
            "Enrollment check completed",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
