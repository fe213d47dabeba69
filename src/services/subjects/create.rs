use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::SubjectService;
use crate::models::{ApiResponse, ErrorCode, subjects::requests::CreateSubjectRequest};
use crate::utils::validate::validate_create_subject;

pub async fn create_subject(
    service: &SubjectService,
    mut body: CreateSubjectRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    body.code = body.code.trim().to_uppercase();
    if let Err(msg) = validate_create_subject(&body) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::SubjectInvalid, msg)));
    }

    let storage = service.get_storage(request)?;

    // 学科代码唯一
    match storage.get_subject_by_code(&body.code).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::SubjectAlreadyExists,
                format!("Subject code {} already exists", body.code),
            )));
        }
        Ok(None) => {}
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Subject creation failed: {}", e.message()),
                )),
            );
        }
    }

    match storage.create_subject(body).await {
        Ok(subject) => {
            info!("Subject {} ({}) created", subject.code, subject.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(subject, "Subject created")))
        }
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Subject creation failed: {}", e.message()),
            )),
        ),
    }
}
