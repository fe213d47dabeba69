use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::AuthService;
use crate::models::{
    ApiResponse, ErrorCode, auth::ChangePasswordRequest, users::requests::UpdateUserRequest,
};
use crate::services::current_user;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validate::validate_password_simple;

/// 修改本人密码：先核对旧密码，再以当前 argon2 参数重新哈希
pub async fn handle_change_password(
    service: &AuthService,
    body: ChangePasswordRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let caller = current_user(request)?;

    if let Err(msg) = validate_password_simple(&body.new_password) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
    }
    if body.new_password == body.old_password {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::UserPasswordInvalid,
            "New password must differ from the old one",
        )));
    }

    let storage = service.get_storage(request)?;
    // 缓存里的用户可能已过期，按库中哈希核对
    let user = match storage.get_user_by_id(caller.id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::NotFound()
                .json(ApiResponse::error_empty(ErrorCode::UserNotFound, "User not found")));
        }
        Err(e) => {
            error!("Password change lookup failed for user {}: {}", caller.id, e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Password change failed",
                )),
            );
        }
    };

    if !verify_password(&body.old_password, &user.password_hash) {
        info!("Rejected password change for user {}: wrong old password", user.id);
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::AuthFailed,
            "Old password is incorrect",
        )));
    }

    let hashed = match hash_password(&body.new_password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Password hashing failed: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Password change failed",
                )),
            );
        }
    };

    let update = UpdateUserRequest {
        password: Some(hashed),
        ..Default::default()
    };
    match storage.update_user(user.id, update).await {
        Ok(Some(_)) => {
            info!("User {} changed password", user.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Password changed successfully")))
        }
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::UserNotFound, "User not found"))),
        Err(e) => {
            error!("Password update failed for user {}: {}", user.id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::UserUpdateFailed,
                    "Password change failed",
                )),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{HttpMessage, http::StatusCode, test::TestRequest, web};

    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
    use crate::storage::{Storage, sea_orm_storage::SeaOrmStorage};

    fn change(old: &str, new: &str) -> ChangePasswordRequest {
        ChangePasswordRequest {
            old_password: old.into(),
            new_password: new.into(),
        }
    }

    #[actix_web::test]
    async fn test_change_password_requires_old_one() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);
        let user = storage
            .create_user(CreateUserRequest {
                email: "pw@example.com".into(),
                password: hash_password("Original123").unwrap(),
                first_name: "Pia".into(),
                last_name: "Wong".into(),
                role: UserRole::Student,
            })
            .await
            .unwrap();
        let req = TestRequest::default()
            .app_data(web::Data::new(storage.clone()))
            .to_http_request();
        req.extensions_mut().insert(user.clone());
        let service = AuthService::new_lazy();

        let resp = handle_change_password(&service, change("Wrong1234", "Replaced456"), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = handle_change_password(&service, change("Original123", "short"), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let stored = storage.get_user_by_id(user.id).await.unwrap().unwrap();
        assert!(verify_password("Original123", &stored.password_hash));

        let resp = handle_change_password(&service, change("Original123", "Replaced456"), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let stored = storage.get_user_by_id(user.id).await.unwrap().unwrap();
        assert!(verify_password("Replaced456", &stored.password_hash));
        assert!(!verify_password("Original123", &stored.password_hash));
    }
}
