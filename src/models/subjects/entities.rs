use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 学科实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/subject.ts")]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub semester: i32,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 学科教师名单中的一条，is_lead 标记负责教师（每个学科至多一位）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/subject.ts")]
pub struct SubjectTeacher {
    pub subject_id: i64,
    pub teacher: crate::models::users::entities::UserBrief,
    pub is_lead: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
