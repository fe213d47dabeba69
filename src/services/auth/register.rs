use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{
    ApiResponse, ErrorCode,
    auth::RegisterRequest,
    users::{entities::UserRole, requests::CreateUserRequest},
};
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_password_simple, validate_person_name};

use super::AuthService;

// 校验注册信息，失败时直接给出响应
fn validate_register(req: &RegisterRequest) -> Result<(), HttpResponse> {
    if let Err(msg) = validate_email(&req.email) {
        return Err(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
    }
    if let Err(msg) = validate_password_simple(&req.password) {
        return Err(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
    }
    for name in [&req.first_name, &req.last_name] {
        if let Err(msg) = validate_person_name(name) {
            return Err(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::UserNameInvalid, msg)));
        }
    }
    Ok(())
}

pub async fn handle_register(
    service: &AuthService,
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    // 1. 校验
    if let Err(response) = validate_register(&register_request) {
        return Ok(response);
    }
    let email = register_request.email.trim().to_lowercase();

    // 2. 检查邮箱是否已存在
    if let Err(response) = check_email_exists(storage.as_ref(), &email).await {
        return Ok(response);
    }

    // 3. 哈希密码
    let password_hash = match hash_password(&register_request.password) {
        Ok(hash) => hash,
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::RegisterFailed,
                    format!("Password hashing failed: {}", e.message()),
                )),
            );
        }
    };

    // 4. 创建用户，自助注册只能是学生
    let create_request = CreateUserRequest {
        email,
        password: password_hash,
        first_name: register_request.first_name.trim().to_string(),
        last_name: register_request.last_name.trim().to_string(),
        role: UserRole::Student,
    };

    match storage.create_user(create_request).await {
        Ok(user) => {
            tracing::info!("Student {} registered", user.email);
            Ok(HttpResponse::Created().json(ApiResponse::success(user, "Registration successful")))
        }
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::RegisterFailed,
                format!("Registration failed: {}", e.message()),
            )),
        ),
    }
}

async fn check_email_exists(storage: &dyn Storage, email: &str) -> Result<(), HttpResponse> {
    match storage.get_user_by_email(email).await {
        Ok(Some(_)) => Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserAlreadyExists,
            "Email already exists",
        ))),
        Ok(None) => Ok(()),
        Err(e) => Err(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::RegisterFailed,
                format!("Register failed: {}", e.message()),
            )),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str, first: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
            first_name: first.into(),
            last_name: "Lovelace".into(),
        }
    }

    #[test]
    fn test_validate_register() {
        assert!(validate_register(&request("ada@example.com", "Str0ng!Pass", "Ada")).is_ok());

        let resp = validate_register(&request("not-an-email", "Str0ng!Pass", "Ada")).unwrap_err();
        assert_eq!(resp.status().as_u16(), 400);
        let resp = validate_register(&request("ada@example.com", "weak", "Ada")).unwrap_err();
        assert_eq!(resp.status().as_u16(), 400);
        let resp = validate_register(&request("ada@example.com", "Str0ng!Pass", "A")).unwrap_err();
        assert_eq!(resp.status().as_u16(), 400);
    }
}
