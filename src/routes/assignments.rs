use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::assignments::requests::{
    GradeRequest, TeachingAssignmentsQuery, UpdateStatusRequest,
};
use crate::services::AssignmentService;
use crate::utils::{SafeIDI64, SafeStudentIdI64};

static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);

pub async fn my_assignment(req: HttpRequest) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.my_assignment(&req).await
}

pub async fn unassign_self(req: HttpRequest) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.unassign_self(&req).await
}

pub async fn unassign_student(
    req: HttpRequest,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.unassign_student(student_id.0, &req).await
}

pub async fn teaching(
    req: HttpRequest,
    query: web::Query<TeachingAssignmentsQuery>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.teaching(query.into_inner(), &req).await
}

pub async fn submit(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.submit(id.0, &req).await
}

pub async fn grade(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<GradeRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.grade(id.0, body.into_inner(), &req).await
}

pub async fn complete(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.complete(id.0, &req).await
}

pub async fn update_status(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<UpdateStatusRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .update_status(id.0, body.into_inner(), &req)
        .await
}

// 配置路由
pub fn configure_assignment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/assignments")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/my")
                    .wrap(middlewares::RequireRole::student_only())
                    .route(web::get().to(my_assignment))
                    .route(web::delete().to(unassign_self)),
            )
            .service(
                web::resource("/{id}/submit")
                    .wrap(middlewares::RequireRole::students())
                    .route(web::post().to(submit)),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::staff())
                    .route("/teaching", web::get().to(teaching))
                    .route("/students/{student_id}", web::delete().to(unassign_student))
                    .route("/{id}/grade", web::post().to(grade))
                    .route("/{id}/complete", web::post().to(complete))
                    .route("/{id}/status", web::put().to(update_status)),
            ),
    );
}
