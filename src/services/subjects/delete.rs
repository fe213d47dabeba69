use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubjectService;
use crate::models::{ApiResponse, ErrorCode, courseworks::requests::CourseworkListQuery};

pub async fn delete_subject(
    service: &SubjectService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    // 学科下仍有课题时不允许删除，避免级联删掉选题记录
    let query = CourseworkListQuery {
        size: Some(1),
        subject_id: Some(id),
        ..Default::default()
    };
    match storage.list_courseworks_with_pagination(query).await {
        Ok(page) if page.pagination.total > 0 => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::Conflict,
                "Subject still has courseworks",
            )));
        }
        Ok(_) => {}
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Subject deletion failed: {}", e.message()),
                )),
            );
        }
    }

    match storage.delete_subject(id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Subject deleted"))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubjectNotFound,
            "Subject not found",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Subject deletion failed: {}", e.message()),
            )),
        ),
    }
}
