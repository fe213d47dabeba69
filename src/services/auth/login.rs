use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse},
};
use crate::utils::jwt;
use crate::utils::password::verify_password;

use super::AuthService;

const LOGIN_FAILED: &str = "Email or password is incorrect";

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let email = login_request.email.trim().to_lowercase();

    // 1. 根据邮箱获取用户信息
    match storage.get_user_by_email(&email).await {
        Ok(Some(user)) => {
            // 2. 验证密码；停用账号与密码错误返回相同信息
            if !user.is_active || !verify_password(&login_request.password, &user.password_hash)
            {
                tracing::info!("Rejected login for {}", email);
                return Ok(HttpResponse::Unauthorized()
                    .json(ApiResponse::error_empty(ErrorCode::AuthFailed, LOGIN_FAILED)));
            }

            // 3. 生成令牌对
            match user.generate_token_pair() {
                Ok(token_pair) => {
                    tracing::info!("User {} logged in successfully", user.email);

                    let response = LoginResponse {
                        access_token: token_pair.access_token,
                        expires_in: jwt::JwtUtils::access_token_ttl_secs(),
                        user,
                    };

                    // 4. 创建 refresh token cookie
                    let refresh_cookie =
                        jwt::JwtUtils::create_refresh_token_cookie(&token_pair.refresh_token);

                    Ok(HttpResponse::Ok()
                        .cookie(refresh_cookie)
                        .json(ApiResponse::success(response, "Login successful")))
                }
                Err(e) => {
                    tracing::error!("Failed to generate JWT token: {}", e);
                    Ok(
                        HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                            ErrorCode::InternalServerError,
                            "Login failed, unable to generate token",
                        )),
                    )
                }
            }
        }
        Ok(None) => Ok(HttpResponse::Unauthorized()
            .json(ApiResponse::error_empty(ErrorCode::AuthFailed, LOGIN_FAILED))),
        Err(e) => {
            tracing::error!("Login lookup failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Login failed",
                )),
            )
        }
    }
}
