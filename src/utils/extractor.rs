//! 路径参数提取器
//!
//! 解析失败时直接返回统一格式的 400 响应，而不是 actix 默认的纯文本错误。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn bad_path_param(name: &str, raw: Option<&str>) -> actix_web::Error {
    let message = match raw {
        Some(raw) => format!("Invalid path parameter '{name}': '{raw}' is not a positive integer"),
        None => format!("Missing path parameter '{name}'"),
    };
    InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
    )
    .into()
}

fn parse_positive_i64(req: &HttpRequest, name: &str) -> Result<i64, actix_web::Error> {
    let raw = req.match_info().get(name);
    raw.and_then(|s| s.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| bad_path_param(name, raw))
}

macro_rules! safe_i64_path {
    ($name:ident, $param:literal) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                ready(parse_positive_i64(req, $param).map($name))
            }
        }
    };
}

safe_i64_path!(SafeIDI64, "id");
safe_i64_path!(SafeStudentIdI64, "student_id");
safe_i64_path!(SafeTeacherIdI64, "teacher_id");

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_valid_id() {
        let req = TestRequest::default().param("id", "42").to_http_request();
        let id = SafeIDI64::extract(&req).await.unwrap();
        assert_eq!(id.0, 42);
    }

    #[actix_web::test]
    async fn test_rejects_non_positive_and_garbage() {
        for raw in ["0", "-3", "abc", "1.5"] {
            let req = TestRequest::default().param("id", raw).to_http_request();
            assert!(SafeIDI64::extract(&req).await.is_err(), "{raw}");
        }
    }

    #[actix_web::test]
    async fn test_student_id_param() {
        let req = TestRequest::default()
            .param("student_id", "7")
            .to_http_request();
        assert_eq!(SafeStudentIdI64::extract(&req).await.unwrap().0, 7);
        assert!(SafeIDI64::extract(&req).await.is_err());
    }
}
