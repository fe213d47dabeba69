use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::models::{ApiResponse, ErrorCode, users::requests::UpdateUserRequest};
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_password_simple, validate_person_name};

// 只校验出现的字段
fn validate_update(update: &UpdateUserRequest) -> Result<(), (ErrorCode, String)> {
    if let Some(email) = &update.email {
        validate_email(email).map_err(|m| (ErrorCode::UserEmailInvalid, m.to_string()))?;
    }
    for name in [&update.first_name, &update.last_name].into_iter().flatten() {
        validate_person_name(name).map_err(|m| (ErrorCode::UserNameInvalid, m.to_string()))?;
    }
    if let Some(password) = &update.password {
        validate_password_simple(password).map_err(|m| (ErrorCode::UserPasswordInvalid, m))?;
    }
    Ok(())
}

pub async fn update_user(
    service: &UserService,
    user_id: i64,
    mut update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err((code, msg)) = validate_update(&update_data) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(code, msg)));
    }

    let storage = service.get_storage(request)?;

    if let Some(email) = update_data.email.take() {
        let email = email.trim().to_lowercase();
        match storage.get_user_by_email(&email).await {
            Ok(Some(other)) if other.id != user_id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::UserAlreadyExists,
                    "Email already exists",
                )));
            }
            Ok(_) => update_data.email = Some(email),
            Err(e) => {
                return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::UserUpdateFailed,
                    format!("Failed to update user information: {}", e.message()),
                )));
            }
        }
    }

    if let Some(password) = update_data.password.take() {
        match hash_password(&password) {
            Ok(hash) => update_data.password = Some(hash),
            Err(e) => {
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        format!("Password hashing failed: {}", e.message()),
                    )),
                );
            }
        }
    }

    match storage.update_user(user_id, update_data).await {
        Ok(Some(user)) => {
            service.invalidate_user_cache(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                user,
                "User information updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::UserUpdateFailed,
                format!("Failed to update user information: {}", e.message()),
            )),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_update_only_checks_present_fields() {
        assert!(validate_update(&UpdateUserRequest::default()).is_ok());

        let bad_email = UpdateUserRequest {
            email: Some("nope".into()),
            ..Default::default()
        };
        assert!(matches!(
            validate_update(&bad_email),
            Err((ErrorCode::UserEmailInvalid, _))
        ));

        let bad_name = UpdateUserRequest {
            last_name: Some("X".into()),
            ..Default::default()
        };
        assert!(matches!(
            validate_update(&bad_name),
            Err((ErrorCode::UserNameInvalid, _))
        ));
    }
}
