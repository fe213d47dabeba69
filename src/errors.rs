//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。
//! 选题流程的错误分类（不存在、重复选题、名额已满、成绩越界、状态非法）
//! 与基础设施错误共用同一个枚举，由服务层映射为 HTTP 状态码。

use std::fmt;

use actix_web::http::StatusCode;

use crate::models::ErrorCode;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_courseforge_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum CourseforgeError {
            $($variant(String),)*
        }

        impl CourseforgeError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(CourseforgeError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(CourseforgeError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(CourseforgeError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl CourseforgeError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        CourseforgeError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_courseforge_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    Timeout("E006", "Operation Timeout"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    FileOperation("E010", "File Operation Error"),
    DateParse("E011", "Date Parse Error"),
    Authentication("E012", "Authentication Error"),
    Authorization("E013", "Authorization Error"),
    Conflict("E014", "Resource Conflict"),
    AlreadyAssigned("E101", "Student Already Assigned"),
    CapacityExceeded("E102", "Coursework Capacity Exceeded"),
    CourseworkUnavailable("E103", "Coursework Unavailable"),
    InvalidGrade("E104", "Invalid Grade"),
    InvalidStatus("E105", "Invalid Status"),
    InvalidTransition("E106", "Invalid Status Transition"),
}

impl CourseforgeError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 底层存储故障（I/O、超时），流程本身不重试，原样上抛
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CourseforgeError::DatabaseOperation(_)
                | CourseforgeError::DatabaseConnection(_)
                | CourseforgeError::Timeout(_)
        )
    }
}

impl CourseforgeError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        use CourseforgeError::*;
        match self {
            NotFound(_) => StatusCode::NOT_FOUND,
            InvalidGrade(_) | InvalidStatus(_) | Validation(_) => StatusCode::BAD_REQUEST,
            AlreadyAssigned(_)
            | CapacityExceeded(_)
            | CourseworkUnavailable(_)
            | InvalidTransition(_)
            | Conflict(_) => StatusCode::CONFLICT,
            Authorization(_) => StatusCode::FORBIDDEN,
            Authentication(_) => StatusCode::UNAUTHORIZED,
            Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 响应体中的业务错误码
    pub fn error_code(&self) -> ErrorCode {
        use CourseforgeError::*;
        match self {
            NotFound(_) => ErrorCode::NotFound,
            AlreadyAssigned(_) => ErrorCode::AssignmentAlreadyExists,
            CapacityExceeded(_) => ErrorCode::CourseworkCapacityExceeded,
            CourseworkUnavailable(_) => ErrorCode::CourseworkUnavailable,
            InvalidGrade(_) => ErrorCode::AssignmentInvalidGrade,
            InvalidStatus(_) => ErrorCode::AssignmentInvalidStatus,
            InvalidTransition(_) => ErrorCode::AssignmentInvalidTransition,
            Validation(_) => ErrorCode::BadRequest,
            Conflict(_) => ErrorCode::Conflict,
            Authorization(_) => ErrorCode::Forbidden,
            Authentication(_) => ErrorCode::Unauthorized,
            Timeout(_) => ErrorCode::ServiceTimeout,
            _ => ErrorCode::InternalServerError,
        }
    }
}

impl fmt::Display for CourseforgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CourseforgeError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for CourseforgeError {
    fn from(err: sea_orm::DbErr) -> Self {
        CourseforgeError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for CourseforgeError {
    fn from(err: std::io::Error) -> Self {
        CourseforgeError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for CourseforgeError {
    fn from(err: serde_json::Error) -> Self {
        CourseforgeError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for CourseforgeError {
    fn from(err: chrono::ParseError) -> Self {
        CourseforgeError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CourseforgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CourseforgeError::cache_connection("test").code(), "E001");
        assert_eq!(CourseforgeError::database_config("test").code(), "E003");
        assert_eq!(CourseforgeError::validation("test").code(), "E007");
        assert_eq!(CourseforgeError::already_assigned("test").code(), "E101");
        assert_eq!(CourseforgeError::invalid_transition("test").code(), "E106");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            CourseforgeError::capacity_exceeded("test").error_type(),
            "Coursework Capacity Exceeded"
        );
        assert_eq!(
            CourseforgeError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_error_message() {
        let err = CourseforgeError::invalid_grade("grade 7 is outside 2..=5");
        assert_eq!(err.message(), "grade 7 is outside 2..=5");
    }

    #[test]
    fn test_format_simple() {
        let err = CourseforgeError::not_found("coursework 3");
        let formatted = err.format_simple();
        assert!(formatted.contains("Resource Not Found"));
        assert!(formatted.contains("coursework 3"));
    }

    #[test]
    fn test_transient_kinds() {
        assert!(CourseforgeError::database_operation("io").is_transient());
        assert!(CourseforgeError::timeout("deadline").is_transient());
        assert!(!CourseforgeError::already_assigned("x").is_transient());
        assert!(!CourseforgeError::not_found("x").is_transient());
    }

    #[test]
    fn test_http_mapping() {
        let cases = [
            (CourseforgeError::not_found("x"), 404),
            (CourseforgeError::invalid_grade("x"), 400),
            (CourseforgeError::invalid_status("x"), 400),
            (CourseforgeError::already_assigned("x"), 409),
            (CourseforgeError::capacity_exceeded("x"), 409),
            (CourseforgeError::coursework_unavailable("x"), 409),
            (CourseforgeError::invalid_transition("x"), 409),
            (CourseforgeError::authorization("x"), 403),
            (CourseforgeError::timeout("x"), 504),
            (CourseforgeError::database_operation("x"), 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err}");
        }
        assert_eq!(
            CourseforgeError::capacity_exceeded("x").error_code() as i32,
            ErrorCode::CourseworkCapacityExceeded as i32
        );
    }

    #[test]
    fn test_from_db_err() {
        let err: CourseforgeError = sea_orm::DbErr::Custom("boom".into()).into();
        assert_eq!(err.code(), "E005");
        assert!(err.message().contains("boom"));
    }
}
