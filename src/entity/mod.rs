//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod courseworks;
pub mod student_courseworks;
pub mod subjects;
pub mod teacher_subjects;
pub mod users;

use chrono::{DateTime, Utc};

/// 存储层统一使用 unix 秒保存时间
pub(crate) fn ts_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}
