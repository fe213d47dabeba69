pub mod assignments;
pub mod auth;
pub mod courseworks;
pub mod subjects;
pub mod system;
pub mod users;

pub use assignments::AssignmentService;
pub use auth::AuthService;
pub use courseworks::CourseworkService;
pub use subjects::SubjectService;
pub use system::SystemService;
pub use users::UserService;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::errors::CourseforgeError;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, users::entities::User};
use crate::storage::Storage;

/// 从 app data 取出存储；未注入时返回 500
pub(crate) fn storage_from(
    cached: &Option<Arc<dyn Storage>>,
    request: &HttpRequest,
) -> ActixResult<Arc<dyn Storage>> {
    if let Some(storage) = cached {
        return Ok(storage.clone());
    }
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Storage not configured"))
}

/// 当前登录用户；路由未挂 RequireJWT 时返回 401
pub(crate) fn current_user(request: &HttpRequest) -> ActixResult<User> {
    RequireJWT::extract_user_claims(request)
        .ok_or_else(|| actix_web::error::ErrorUnauthorized("Authentication required"))
}

/// 领域错误转为统一响应体
pub(crate) fn error_response(err: &CourseforgeError) -> HttpResponse {
    HttpResponse::build(err.status_code())
        .json(ApiResponse::error_empty(err.error_code(), err.message()))
}
