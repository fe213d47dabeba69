//! 课题实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "courseworks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub requirements: Option<String>,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub max_students: i32,
    pub difficulty_level: String,
    pub is_available: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subjects::Entity",
        from = "Column::SubjectId",
        to = "super::subjects::Column::Id",
        on_delete = "Cascade"
    )]
    Subject,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::TeacherId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Teacher,
    #[sea_orm(has_many = "super::student_courseworks::Entity")]
    StudentCourseworks,
}

impl Related<super::subjects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::student_courseworks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentCourseworks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_coursework(self) -> crate::models::courseworks::entities::Coursework {
        use crate::models::courseworks::entities::{Coursework, DifficultyLevel};

        Coursework {
            id: self.id,
            title: self.title,
            description: self.description,
            requirements: self.requirements,
            subject_id: self.subject_id,
            teacher_id: self.teacher_id,
            max_students: self.max_students,
            difficulty_level: self
                .difficulty_level
                .parse::<DifficultyLevel>()
                .unwrap_or(DifficultyLevel::Medium),
            is_available: self.is_available,
            created_at: super::ts_to_datetime(self.created_at),
            updated_at: super::ts_to_datetime(self.updated_at),
        }
    }
}
