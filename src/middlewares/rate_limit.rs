/*!
 * 速率限制中间件
 *
 * 固定窗口计数：键为 `前缀:身份:窗口序号`，身份优先取已认证用户 ID，否则取客户端 IP。
 * 超过限制返回 429，并带上 `Retry-After`。
 *
 * ```rust,ignore
 * web::scope("/api/v1/auth")
 *     .service(
 *         web::resource("/login")
 *             .wrap(RateLimit::login())
 *             .route(web::post().to(login)),
 *     )
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::{ApiResponse, ErrorCode};

/// 窗口计数缓存；条目存活期覆盖最长窗口即可
static RATE_LIMIT_CACHE: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(3600))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone, Debug)]
pub struct RateLimit {
    /// 窗口内允许的最大请求数
    max_requests: u32,
    /// 窗口长度（秒）
    window_secs: u64,
    key_prefix: &'static str,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64, key_prefix: &'static str) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.clamp(1, 3600),
            key_prefix,
        }
    }

    /// 登录：5次/分钟/IP
    pub fn login() -> Self {
        Self::new(5, 60, "login")
    }

    /// 注册：3次/分钟/IP
    pub fn register() -> Self {
        Self::new(3, 60, "register")
    }

    /// 刷新令牌：10次/分钟/IP
    pub fn refresh_token() -> Self {
        Self::new(10, 60, "refresh")
    }

    /// 修改密码：5次/分钟/IP
    pub fn password_change() -> Self {
        Self::new(5, 60, "password")
    }

    /// 选题：次数取 workflow.enroll_requests_per_minute
    pub fn enrollment() -> Self {
        let per_minute = crate::config::AppConfig::get()
            .workflow
            .enroll_requests_per_minute;
        Self::new(per_minute.max(1), 60, "enroll")
    }

    fn window_key(&self, identifier: &str, now_secs: u64) -> String {
        format!(
            "{}:{}:{}",
            self.key_prefix,
            identifier,
            now_secs / self.window_secs
        )
    }

    /// 当前窗口剩余秒数
    fn retry_after(&self, now_secs: u64) -> u64 {
        self.window_secs - now_secs % self.window_secs
    }
}

/// 从请求中提取客户端 IP；转发头只在连接地址不可解析时采用
fn extract_client_ip(req: &ServiceRequest) -> String {
    use std::net::IpAddr;

    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());
    if let Some(ref ip) = connection_ip
        && ip.parse::<IpAddr>().is_ok()
    {
        return ip.clone();
    }

    for header in ["X-Forwarded-For", "X-Real-IP"] {
        if let Some(value) = req.headers().get(header)
            && let Ok(value) = value.to_str()
            && let Some(ip) = value.split(',').next().map(str::trim)
            && ip.parse::<IpAddr>().is_ok()
        {
            return ip.to_string();
        }
    }

    connection_ip.unwrap_or_else(|| "unknown".to_string())
}

fn extract_user_id(req: &ServiceRequest) -> Option<i64> {
    use crate::models::users::entities::User;
    req.extensions().get::<User>().map(|user| user.id)
}

fn create_rate_limit_response(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header(("Retry-After", retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limit = self.limit.clone();

        Box::pin(async move {
            let identifier = extract_user_id(&req)
                .map(|id| format!("user:{id}"))
                .unwrap_or_else(|| format!("ip:{}", extract_client_ip(&req)));
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            let key = limit.window_key(&identifier, now);

            // 原子自增
            let count = RATE_LIMIT_CACHE
                .entry(key.clone())
                .and_upsert_with(|current| {
                    let next = current.map(|e| e.into_value()).unwrap_or(0) + 1;
                    std::future::ready(next)
                })
                .await
                .into_value();

            if count > limit.max_requests {
                warn!(
                    "Rate limit exceeded for key: {} ({}/{})",
                    key, count, limit.max_requests
                );
                return Ok(req.into_response(
                    create_rate_limit_response(limit.retry_after(now)).map_into_right_body(),
                ));
            }

            let res = srv.call(req).await?.map_into_left_body();
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_presets() {
        let login = RateLimit::login();
        assert_eq!(login.max_requests, 5);
        assert_eq!(login.window_secs, 60);
        assert_eq!(login.key_prefix, "login");

        assert_eq!(RateLimit::register().max_requests, 3);
        assert_eq!(RateLimit::enrollment().key_prefix, "enroll");
        assert_eq!(RateLimit::password_change().key_prefix, "password");
    }

    #[test]
    fn test_window_keys_roll_over() {
        let limit = RateLimit::login();
        assert_eq!(limit.window_key("ip:1.2.3.4", 119), "login:ip:1.2.3.4:1");
        assert_eq!(limit.window_key("ip:1.2.3.4", 120), "login:ip:1.2.3.4:2");
        assert_eq!(limit.retry_after(119), 1);
        assert_eq!(limit.retry_after(120), 60);
    }

    #[test]
    fn test_window_is_clamped() {
        assert_eq!(RateLimit::new(1, 0, "x").window_secs, 1);
        assert_eq!(RateLimit::new(1, 86_400, "x").window_secs, 3600);
    }

    #[actix_web::test]
    async fn test_blocks_after_limit() {
        use actix_web::{App, HttpResponse, test, web};

        let app = test::init_service(
            App::new().service(
                web::resource("/ping")
                    .wrap(RateLimit::new(2, 3600, "test_block"))
                    .route(web::get().to(HttpResponse::Ok)),
            ),
        )
        .await;

        for _ in 0..2 {
            let resp = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
            assert!(resp.status().is_success());
        }
        let resp = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key("Retry-After"));
    }
}
