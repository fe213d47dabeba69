use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, ensure_teacher_of};
use crate::errors::CourseforgeError;
use crate::models::ApiResponse;
use crate::models::assignments::requests::TeachingAssignmentsQuery;
use crate::models::assignments::responses::AssignmentListResponse;
use crate::services::{current_user, error_response};

pub async fn progress(
    service: &AssignmentService,
    coursework_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    // 先确认归属，再汇总
    let coursework = match storage.get_coursework_by_id(coursework_id).await {
        Ok(Some(cw)) => cw,
        Ok(None) => {
            return Ok(error_response(&CourseforgeError::not_found(format!(
                "Coursework {coursework_id} not found"
            ))));
        }
        Err(e) => return Ok(error_response(&e)),
    };
    if let Err(e) = ensure_teacher_of(&user, coursework.teacher_id) {
        return Ok(error_response(&e));
    }

    match service.workflow(request)?.progress(coursework_id).await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            report,
            "Coursework progress retrieved",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn my_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;

    match service
        .workflow(request)?
        .get_student_assignment(user.id)
        .await
    {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "Assignment retrieved",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn teaching(
    service: &AssignmentService,
    query: TeachingAssignmentsQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;

    let teacher_id = if user.is_admin() {
        match query.teacher_id {
            Some(id) => id,
            None => {
                return Ok(error_response(&CourseforgeError::validation(
                    "teacher_id is required",
                )));
            }
        }
    } else {
        user.id
    };

    match service
        .workflow(request)?
        .teacher_assignments(teacher_id)
        .await
    {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            AssignmentListResponse { items },
            "Assignments retrieved",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
