use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubjectService;
use crate::models::{ApiResponse, ErrorCode, subjects::requests::UpdateSubjectRequest};
use crate::utils::validate::validate_update_subject;

pub async fn update_subject(
    service: &SubjectService,
    id: i64,
    mut body: UpdateSubjectRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    body.code = body.code.map(|code| code.trim().to_uppercase());
    if let Err(msg) = validate_update_subject(&body) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::SubjectInvalid, msg)));
    }

    let storage = service.get_storage(request)?;

    if let Some(code) = &body.code {
        match storage.get_subject_by_code(code).await {
            Ok(Some(other)) if other.id != id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::SubjectAlreadyExists,
                    format!("Subject code {code} already exists"),
                )));
            }
            Ok(_) => {}
            Err(e) => {
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        format!("Subject update failed: {}", e.message()),
                    )),
                );
            }
        }
    }

    match storage.update_subject(id, body).await {
        Ok(Some(subject)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(subject, "Subject updated")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubjectNotFound,
            "Subject not found",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Subject update failed: {}", e.message()),
            )),
        ),
    }
}
