use super::entities::Coursework;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/coursework.ts")]
pub struct CourseworkListResponse {
    pub items: Vec<Coursework>,
    pub pagination: PaginationInfo,
}

// 可选课题：附带当前人数与剩余名额
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/coursework.ts")]
pub struct AvailableCoursework {
    #[serde(flatten)]
    #[ts(flatten)]
    pub coursework: Coursework,
    pub enrolled_students: i64,
    pub free_slots: i64,
}

impl AvailableCoursework {
    pub fn new(coursework: Coursework, enrolled: u64) -> Self {
        let free_slots = coursework.free_slots(enrolled) as i64;
        Self {
            coursework,
            enrolled_students: enrolled as i64,
            free_slots,
        }
    }
}
