//! 账号管理
//!
//! 管理员维护学生、教师与管理员账号；教师的学科列表对所有已登录用户开放。
//! 账号变更后整体清空认证缓存，缓存按令牌分键，无法只剔除单个用户。

pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod subjects;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;
use tracing::debug;

use crate::cache::ObjectCache;
use crate::models::users::entities::User;
use crate::models::users::requests::{CreateUserRequest, UpdateUserRequest, UserListParams};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct UserService {
    storage: Option<Arc<dyn Storage>>,
}

impl UserService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from(&self.storage, request)
    }

    pub(crate) async fn invalidate_user_cache(&self, request: &HttpRequest) {
        if let Some(cache) = request.app_data::<web::Data<Arc<dyn ObjectCache>>>() {
            cache.invalidate_all().await;
            debug!("Authenticated user cache cleared");
        }
    }

    /// 按 ID 取账号；不存在或查询失败时给出可直接返回的响应
    pub(crate) async fn find_user(
        &self,
        user_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<Result<User, HttpResponse>> {
        let storage = self.get_storage(request)?;
        Ok(match storage.get_user_by_id(user_id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "User not found",
            ))),
            Err(e) => Err(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to get user information: {}", e.message()),
            ))),
        })
    }

    pub async fn list_users(
        &self,
        query: UserListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_users(self, query, request).await
    }

    pub async fn create_user(
        &self,
        body: CreateUserRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_user(self, body, request).await
    }

    pub async fn get_user(&self, user_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_user(self, user_id, request).await
    }

    pub async fn update_user(
        &self,
        user_id: i64,
        body: UpdateUserRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_user(self, user_id, body, request).await
    }

    pub async fn delete_user(
        &self,
        user_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_user(self, user_id, request).await
    }

    pub async fn list_teacher_subjects(
        &self,
        teacher_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        subjects::list_teacher_subjects(self, teacher_id, request).await
    }
}
