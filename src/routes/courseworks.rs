use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RateLimit};
use crate::models::assignments::requests::{AssignRequest, CanAssignQuery};
use crate::models::courseworks::requests::{
    AvailableCourseworkParams, CourseworkListParams, CreateCourseworkRequest,
    SetAvailabilityRequest, UpdateCourseworkRequest,
};
use crate::services::{AssignmentService, CourseworkService};
use crate::utils::SafeIDI64;

static COURSEWORK_SERVICE: Lazy<CourseworkService> = Lazy::new(CourseworkService::new_lazy);
static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);

pub async fn list_courseworks(
    req: HttpRequest,
    query: web::Query<CourseworkListParams>,
) -> ActixResult<HttpResponse> {
    COURSEWORK_SERVICE
        .list_courseworks(query.into_inner(), &req)
        .await
}

pub async fn list_available(
    req: HttpRequest,
    query: web::Query<AvailableCourseworkParams>,
) -> ActixResult<HttpResponse> {
    COURSEWORK_SERVICE
        .list_available(query.into_inner(), &req)
        .await
}

pub async fn get_coursework(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSEWORK_SERVICE.get_coursework(id.0, &req).await
}

pub async fn create_coursework(
    req: HttpRequest,
    body: web::Json<CreateCourseworkRequest>,
) -> ActixResult<HttpResponse> {
    COURSEWORK_SERVICE
        .create_coursework(body.into_inner(), &req)
        .await
}

pub async fn update_coursework(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<UpdateCourseworkRequest>,
) -> ActixResult<HttpResponse> {
    COURSEWORK_SERVICE
        .update_coursework(id.0, body.into_inner(), &req)
        .await
}

pub async fn set_availability(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<SetAvailabilityRequest>,
) -> ActixResult<HttpResponse> {
    COURSEWORK_SERVICE
        .set_availability(id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_coursework(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSEWORK_SERVICE.delete_coursework(id.0, &req).await
}

// 选题请求体可省略
pub async fn assign(
    req: HttpRequest,
    id: SafeIDI64,
    body: Option<web::Json<AssignRequest>>,
) -> ActixResult<HttpResponse> {
    let body = body.map(|b| b.into_inner()).unwrap_or_default();
    ASSIGNMENT_SERVICE.assign(id.0, body, &req).await
}

pub async fn can_assign(
    req: HttpRequest,
    id: SafeIDI64,
    query: web::Query<CanAssignQuery>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .can_assign(id.0, query.into_inner(), &req)
        .await
}

pub async fn progress(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.progress(id.0, &req).await
}

// 配置路由
pub fn configure_coursework_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courseworks")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_courseworks))
            .route("/available", web::get().to(list_available))
            .route("/{id}", web::get().to(get_coursework))
            // 学生自选，管理员代选
            .service(
                web::resource("/{id}/assign")
                    .wrap(RateLimit::enrollment())
                    .wrap(middlewares::RequireRole::students())
                    .route(web::post().to(assign)),
            )
            .service(
                web::resource("/{id}/can-assign")
                    .wrap(middlewares::RequireRole::students())
                    .route(web::get().to(can_assign)),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::staff())
                    .route("", web::post().to(create_coursework))
                    .route("/{id}", web::put().to(update_coursework))
                    .route("/{id}", web::delete().to(delete_coursework))
                    .route("/{id}/availability", web::put().to(set_availability))
                    .route("/{id}/progress", web::get().to(progress)),
            ),
    );
}
