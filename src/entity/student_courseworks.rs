//! 学生选题实体
//!
//! `active_student_id` 在记录存活时等于 `student_id`，撤销（软删除）后置 NULL；
//! 该列上的唯一索引保证每个学生至多一条存活记录。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "student_courseworks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub coursework_id: i64,
    pub status: String,
    pub grade: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,
    pub submitted_at: Option<i64>,
    pub completed_at: Option<i64>,
    #[sea_orm(unique)]
    pub active_student_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::StudentId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::courseworks::Entity",
        from = "Column::CourseworkId",
        to = "super::courseworks::Column::Id",
        on_delete = "Cascade"
    )]
    Coursework,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::courseworks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coursework.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_assignment(self) -> crate::models::assignments::entities::StudentCoursework {
        use crate::models::assignments::entities::{AssignmentStatus, StudentCoursework};

        StudentCoursework {
            id: self.id,
            student_id: self.student_id,
            coursework_id: self.coursework_id,
            status: self
                .status
                .parse::<AssignmentStatus>()
                .unwrap_or(AssignmentStatus::Assigned),
            grade: self.grade,
            feedback: self.feedback,
            submitted_at: self.submitted_at.map(super::ts_to_datetime),
            completed_at: self.completed_at.map(super::ts_to_datetime),
            created_at: super::ts_to_datetime(self.created_at),
            updated_at: super::ts_to_datetime(self.updated_at),
        }
    }
}
