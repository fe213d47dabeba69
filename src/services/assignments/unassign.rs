use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, ensure_teacher_of};
use crate::models::ApiResponse;
use crate::services::{current_user, error_response};

pub async fn unassign_self(
    service: &AssignmentService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;

    match service.workflow(request)?.unassign(user.id).await {
        Ok(released) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            released,
            "Unassigned from coursework",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn unassign_student(
    service: &AssignmentService,
    student_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let workflow = service.workflow(request)?;

    let detail = match workflow.get_student_assignment(student_id).await {
        Ok(detail) => detail,
        Err(e) => return Ok(error_response(&e)),
    };
    if let Err(e) = ensure_teacher_of(&user, detail.coursework.teacher_id) {
        return Ok(error_response(&e));
    }

    match workflow.unassign(student_id).await {
        Ok(released) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            released,
            "Student unassigned from coursework",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
