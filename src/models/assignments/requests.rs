use serde::Deserialize;
use ts_rs::TS;

// 选题请求；管理员代学生选题时填写 student_id
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignRequest {
    pub student_id: Option<i64>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct GradeRequest {
    pub grade: i32,
    pub feedback: Option<String>,
}

// 状态以字符串接收，由流程层校验枚举成员
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct TeachingAssignmentsQuery {
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct CanAssignQuery {
    pub student_id: Option<i64>,
}
