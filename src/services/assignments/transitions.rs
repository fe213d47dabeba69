use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, AssignmentWorkflow, ensure_student_of, ensure_teacher_of};
use crate::errors::CourseforgeError;
use crate::models::ApiResponse;
use crate::models::assignments::requests::{GradeRequest, UpdateStatusRequest};
use crate::models::users::entities::User;
use crate::services::{current_user, error_response};

enum Owner {
    Student,
    Teacher,
}

// 读取选题并校验调用者对其的权限
async fn authorize(
    workflow: &AssignmentWorkflow,
    user: &User,
    id: i64,
    owner: Owner,
) -> Result<(), CourseforgeError> {
    let detail = workflow.detail(id).await?;
    match owner {
        Owner::Student => ensure_student_of(user, &detail),
        Owner::Teacher => ensure_teacher_of(user, detail.coursework.teacher_id),
    }
}

pub async fn submit(
    service: &AssignmentService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let workflow = service.workflow(request)?;

    let result = match authorize(&workflow, &user, id, Owner::Student).await {
        Ok(()) => workflow.submit(id).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(updated) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            updated,
            "Assignment submitted",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn grade(
    service: &AssignmentService,
    id: i64,
    body: GradeRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let workflow = service.workflow(request)?;

    let result = match authorize(&workflow, &user, id, Owner::Teacher).await {
        Ok(()) => workflow.grade(id, body.grade, body.feedback).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(updated) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            updated,
            "Assignment graded",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn complete(
    service: &AssignmentService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let workflow = service.workflow(request)?;

    let result = match authorize(&workflow, &user, id, Owner::Teacher).await {
        Ok(()) => workflow.complete(id).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(updated) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            updated,
            "Assignment completed",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn update_status(
    service: &AssignmentService,
    id: i64,
    body: UpdateStatusRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let workflow = service.workflow(request)?;

    let result = match authorize(&workflow, &user, id, Owner::Teacher).await {
        Ok(()) => workflow.update_status(id, &body.status).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(updated) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            updated,
            "Assignment status updated",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
