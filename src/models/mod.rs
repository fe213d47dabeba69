pub mod assignments;
pub mod auth;
pub mod common;
pub mod courseworks;
pub mod subjects;
pub mod system;
pub mod users;

pub use common::{ApiResponse, PaginationInfo, PaginationQuery};

use serde::{Deserialize, Serialize};

/// 程序启动时间，用于健康检查中的运行时长
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码
///
/// 0 为成功；1xxx 通用；2xxx 认证；3xxx 用户；4xxx 学科；5xxx 课题；6xxx 选题。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1009,
    RateLimitExceeded = 1429,
    InternalServerError = 1500,
    ServiceTimeout = 1504,

    // 认证
    AuthFailed = 2000,
    RegisterFailed = 2001,

    // 用户
    UserNotFound = 3000,
    UserAlreadyExists = 3001,
    UserEmailInvalid = 3002,
    UserPasswordInvalid = 3003,
    UserNameInvalid = 3004,
    UserCreationFailed = 3005,
    UserUpdateFailed = 3006,
    UserDeleteFailed = 3007,
    CanNotDeleteCurrentUser = 3008,

    // 学科
    SubjectNotFound = 4000,
    SubjectAlreadyExists = 4001,
    SubjectInvalid = 4002,

    // 课题
    CourseworkNotFound = 5000,
    CourseworkInvalid = 5001,
    CourseworkUnavailable = 5002,
    CourseworkCapacityExceeded = 5003,
    CourseworkPermissionDenied = 5004,
    CourseworkInUse = 5005,

    // 选题
    AssignmentNotFound = 6000,
    AssignmentAlreadyExists = 6001,
    AssignmentInvalidGrade = 6002,
    AssignmentInvalidStatus = 6003,
    AssignmentInvalidTransition = 6004,
}
