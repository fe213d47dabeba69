//! 角色守卫
//!
//! 挂在 `RequireJWT` 内层：JWT 中间件把当前 `User` 放进请求扩展，这里只比较角色。
//! 守卫持有一个固定的角色集合，命中任一即放行。
//!
//! ```rust,ignore
//! web::scope("/api/v1/subjects")
//!     .wrap(RequireJWT)
//!     .service(web::scope("").wrap(RequireRole::admin()).route(...))
//! ```

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, warn};

use super::create_error_response;
use crate::models::{
    ErrorCode,
    users::entities::{User, UserRole},
};

#[derive(Clone, Copy)]
pub struct RequireRole {
    allowed: &'static [UserRole],
}

impl RequireRole {
    /// 仅管理员
    pub fn admin() -> Self {
        Self::any_of(UserRole::admin_roles())
    }

    /// 教师与管理员
    pub fn staff() -> Self {
        Self::any_of(UserRole::teacher_roles())
    }

    /// 学生与管理员（管理员可代学生操作）
    pub fn students() -> Self {
        Self::any_of(UserRole::student_roles())
    }

    /// 仅学生本人，管理员没有"我的选题"
    pub fn student_only() -> Self {
        Self::any_of(&[UserRole::Student])
    }

    pub fn any_of(allowed: &'static [UserRole]) -> Self {
        Self { allowed }
    }

    fn admits(&self, user: Option<&User>) -> Result<(), (StatusCode, ErrorCode, String)> {
        let Some(user) = user else {
            return Err((
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "Authentication required".to_string(),
            ));
        };
        if self.allowed.contains(&user.role) {
            return Ok(());
        }
        let wanted = self
            .allowed
            .iter()
            .map(UserRole::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Err((
            StatusCode::FORBIDDEN,
            ErrorCode::Forbidden,
            format!("Access denied: requires role {wanted}"),
        ))
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            guard: *self,
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    guard: RequireRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let verdict = self.guard.admits(req.extensions().get::<User>());

        Box::pin(async move {
            match verdict {
                Ok(()) => Ok(srv.call(req).await?.map_into_left_body()),
                Err((status, code, message)) => {
                    if status == StatusCode::UNAUTHORIZED {
                        warn!("Role guard reached without a user on {}", req.path());
                    } else {
                        debug!("{} on {} {}", message, req.method(), req.path());
                    }
                    Ok(req.into_response(
                        create_error_response(status, code, &message).map_into_right_body(),
                    ))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, dev::Service as _, test, web};

    fn user(role: UserRole) -> User {
        User {
            id: 7,
            email: "guard@example.com".into(),
            password_hash: String::new(),
            first_name: "Gia".into(),
            last_name: "Ward".into(),
            role,
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[::core::prelude::v1::test]
    fn test_role_sets() {
        assert!(RequireRole::staff().admits(Some(&user(UserRole::Teacher))).is_ok());
        assert!(RequireRole::staff().admits(Some(&user(UserRole::Admin))).is_ok());
        assert!(RequireRole::students().admits(Some(&user(UserRole::Admin))).is_ok());

        let (status, _, message) = RequireRole::student_only()
            .admits(Some(&user(UserRole::Admin)))
            .unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(message.contains("student"));

        let (status, ..) = RequireRole::admin().admits(None).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_guard_in_scope() {
        let app = test::init_service(
            App::new().service(
                web::scope("/admin")
                    .wrap(RequireRole::admin())
                    .wrap_fn(|req, srv| {
                        let role = match req.headers().get("x-role").and_then(|v| v.to_str().ok()) {
                            Some("admin") => Some(UserRole::Admin),
                            Some("teacher") => Some(UserRole::Teacher),
                            _ => None,
                        };
                        if let Some(role) = role {
                            req.extensions_mut().insert(user(role));
                        }
                        srv.call(req)
                    })
                    .route("", web::get().to(HttpResponse::Ok)),
            ),
        )
        .await;

        let call = |role: Option<&'static str>| {
            let mut req = test::TestRequest::get().uri("/admin");
            if let Some(role) = role {
                req = req.insert_header(("x-role", role));
            }
            req.to_request()
        };

        assert_eq!(app.call(call(Some("admin"))).await.unwrap().status(), StatusCode::OK);
        assert_eq!(
            app.call(call(Some("teacher"))).await.unwrap().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(app.call(call(None)).await.unwrap().status(), StatusCode::UNAUTHORIZED);
    }
}
