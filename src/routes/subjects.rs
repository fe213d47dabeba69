use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::subjects::requests::{
    AddSubjectTeacherRequest, CreateSubjectRequest, SetLeadTeacherRequest, SubjectListQuery,
    UpdateSubjectRequest,
};
use crate::services::SubjectService;
use crate::utils::{SafeIDI64, SafeTeacherIdI64};

static SUBJECT_SERVICE: Lazy<SubjectService> = Lazy::new(SubjectService::new_lazy);

pub async fn list_subjects(
    req: HttpRequest,
    query: web::Query<SubjectListQuery>,
) -> ActixResult<HttpResponse> {
    SUBJECT_SERVICE.list_subjects(query.into_inner(), &req).await
}

pub async fn get_subject(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    SUBJECT_SERVICE.get_subject(id.0, &req).await
}

pub async fn create_subject(
    req: HttpRequest,
    body: web::Json<CreateSubjectRequest>,
) -> ActixResult<HttpResponse> {
    SUBJECT_SERVICE.create_subject(body.into_inner(), &req).await
}

pub async fn update_subject(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<UpdateSubjectRequest>,
) -> ActixResult<HttpResponse> {
    SUBJECT_SERVICE
        .update_subject(id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_subject(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    SUBJECT_SERVICE.delete_subject(id.0, &req).await
}

pub async fn list_teachers(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    SUBJECT_SERVICE.list_teachers(id.0, &req).await
}

pub async fn add_teacher(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<AddSubjectTeacherRequest>,
) -> ActixResult<HttpResponse> {
    SUBJECT_SERVICE
        .add_teacher(id.0, body.into_inner(), &req)
        .await
}

pub async fn remove_teacher(
    req: HttpRequest,
    id: SafeIDI64,
    teacher_id: SafeTeacherIdI64,
) -> ActixResult<HttpResponse> {
    SUBJECT_SERVICE.remove_teacher(id.0, teacher_id.0, &req).await
}

pub async fn set_lead_teacher(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<SetLeadTeacherRequest>,
) -> ActixResult<HttpResponse> {
    SUBJECT_SERVICE
        .set_lead_teacher(id.0, body.into_inner(), &req)
        .await
}

// 配置路由：读取对所有登录用户开放，写入仅限管理员
pub fn configure_subject_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/subjects")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_subjects))
            .route("/{id}", web::get().to(get_subject))
            .route("/{id}/teachers", web::get().to(list_teachers))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::admin())
                    .route("", web::post().to(create_subject))
                    .route("/{id}", web::put().to(update_subject))
                    .route("/{id}", web::delete().to(delete_subject))
                    .route("/{id}/teachers", web::post().to(add_teacher))
                    .route(
                        "/{id}/teachers/{teacher_id}",
                        web::delete().to(remove_teacher),
                    )
                    .route("/{id}/lead-teacher", web::put().to(set_lead_teacher)),
            ),
    );
}
