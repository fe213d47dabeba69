use super::entities::DifficultyLevel;
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/coursework.ts")]
pub struct CreateCourseworkRequest {
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub subject_id: i64,
    /// 管理员代教师创建时必填；教师创建时忽略
    pub teacher_id: Option<i64>,
    pub max_students: i32,
    pub difficulty_level: DifficultyLevel,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/coursework.ts")]
pub struct UpdateCourseworkRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub subject_id: Option<i64>,
    pub max_students: Option<i32>,
    pub difficulty_level: Option<DifficultyLevel>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/coursework.ts")]
pub struct SetAvailabilityRequest {
    pub is_available: bool,
}

// 课题列表查询参数（来自HTTP请求）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/coursework.ts")]
pub struct CourseworkListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default, deserialize_with = "crate::models::common::pagination::deserialize_optional_from_str")]
    pub subject_id: Option<i64>,
    #[serde(default, deserialize_with = "crate::models::common::pagination::deserialize_optional_from_str")]
    pub teacher_id: Option<i64>,
    #[serde(default, deserialize_with = "crate::models::common::pagination::deserialize_optional_from_str")]
    pub available: Option<bool>,
    pub difficulty: Option<DifficultyLevel>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/coursework.ts")]
pub struct AvailableCourseworkParams {
    pub subject_id: Option<i64>,
}

// 课题列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct CourseworkListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub subject_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub available: Option<bool>,
    pub difficulty: Option<DifficultyLevel>,
}

impl From<CourseworkListParams> for CourseworkListQuery {
    fn from(params: CourseworkListParams) -> Self {
        Self {
            page: Some(params.pagination.page),
            size: Some(params.pagination.size),
            subject_id: params.subject_id,
            teacher_id: params.teacher_id,
            available: params.available,
            difficulty: params.difficulty,
        }
    }
}
