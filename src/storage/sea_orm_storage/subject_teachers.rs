//! 学科教师名单的存储实现
//!
//! 每个学科至多一位负责教师：设置负责人时在同一事务里先清空其余标记。

use super::SeaOrmStorage;
use crate::entity::teacher_subjects::{ActiveModel, Column, Entity as TeacherSubjects};
use crate::entity::subjects::{Column as SubjectColumn, Entity as Subjects};
use crate::entity::users::Entity as Users;
use crate::errors::{CourseforgeError, Result};
use crate::models::{
    subjects::entities::{Subject, SubjectTeacher},
    users::entities::UserBrief,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait,
};

fn db_err(action: &str, e: sea_orm::DbErr) -> CourseforgeError {
    CourseforgeError::database_operation(format!("{action}: {e}"))
}

async fn clear_lead<C: ConnectionTrait>(conn: &C, subject_id: i64) -> Result<()> {
    TeacherSubjects::update_many()
        .col_expr(Column::IsLead, Expr::value(false))
        .filter(Column::SubjectId.eq(subject_id))
        .exec(conn)
        .await
        .map_err(|e| db_err("清除负责教师失败", e))?;
    Ok(())
}

impl SeaOrmStorage {
    /// 把教师加入学科名单；已在名单中时返回 Conflict
    pub async fn add_subject_teacher_impl(
        &self,
        subject_id: i64,
        teacher_id: i64,
        is_lead: bool,
    ) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_err("开启事务失败", e))?;

        if is_lead {
            clear_lead(&txn, subject_id).await?;
        }

        let model = ActiveModel {
            subject_id: Set(subject_id),
            teacher_id: Set(teacher_id),
            is_lead: Set(is_lead),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };
        match model.insert(&txn).await {
            Ok(_) => {}
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(CourseforgeError::conflict(format!(
                    "Teacher {teacher_id} is already on subject {subject_id}"
                )));
            }
            Err(e) => return Err(db_err("添加学科教师失败", e)),
        }

        txn.commit().await.map_err(|e| db_err("提交事务失败", e))
    }

    pub async fn remove_subject_teacher_impl(&self, subject_id: i64, teacher_id: i64) -> Result<bool> {
        let result = TeacherSubjects::delete_many()
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::TeacherId.eq(teacher_id))
            .exec(&self.db)
            .await
            .map_err(|e| db_err("移除学科教师失败", e))?;

        Ok(result.rows_affected > 0)
    }

    /// 指定负责教师；教师不在名单中时返回 false 且不改动任何行
    pub async fn set_subject_lead_teacher_impl(
        &self,
        subject_id: i64,
        teacher_id: i64,
    ) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_err("开启事务失败", e))?;

        let Some(entry) = TeacherSubjects::find()
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::TeacherId.eq(teacher_id))
            .one(&txn)
            .await
            .map_err(|e| db_err("查询学科教师失败", e))?
        else {
            return Ok(false);
        };

        clear_lead(&txn, subject_id).await?;
        TeacherSubjects::update_many()
            .col_expr(Column::IsLead, Expr::value(true))
            .filter(Column::Id.eq(entry.id))
            .exec(&txn)
            .await
            .map_err(|e| db_err("设置负责教师失败", e))?;

        txn.commit().await.map_err(|e| db_err("提交事务失败", e))?;
        Ok(true)
    }

    /// 负责教师排在最前，其余按加入时间
    pub async fn list_subject_teachers_impl(&self, subject_id: i64) -> Result<Vec<SubjectTeacher>> {
        let rows = TeacherSubjects::find()
            .filter(Column::SubjectId.eq(subject_id))
            .order_by_desc(Column::IsLead)
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .find_also_related(Users)
            .all(&self.db)
            .await
            .map_err(|e| db_err("查询学科教师失败", e))?;

        rows.into_iter()
            .map(|(entry, user)| {
                let user = user
                    .ok_or_else(|| {
                        CourseforgeError::database_operation(format!(
                            "Roster entry {} references a missing teacher",
                            entry.id
                        ))
                    })?
                    .into_user();
                Ok(SubjectTeacher {
                    subject_id: entry.subject_id,
                    teacher: UserBrief::from(&user),
                    is_lead: entry.is_lead,
                    created_at: crate::entity::ts_to_datetime(entry.created_at),
                })
            })
            .collect()
    }

    /// 教师所在的全部学科，按学期与代码排序
    pub async fn list_subjects_by_teacher_impl(&self, teacher_id: i64) -> Result<Vec<Subject>> {
        let subjects = Subjects::find()
            .inner_join(TeacherSubjects)
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_asc(SubjectColumn::Semester)
            .order_by_asc(SubjectColumn::Code)
            .all(&self.db)
            .await
            .map_err(|e| db_err("查询教师学科失败", e))?;

        Ok(subjects.into_iter().map(|m| m.into_subject()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subjects::requests::CreateSubjectRequest;
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
    use crate::storage::sea_orm_storage::courseworks::tests::seed_catalog;

    async fn second_teacher(storage: &SeaOrmStorage) -> i64 {
        storage
            .create_user_impl(CreateUserRequest {
                email: "lee@example.com".into(),
                password: "hashed".into(),
                first_name: "Lee".into(),
                last_name: "Chang".into(),
                role: UserRole::Teacher,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_roster_membership() {
        let storage = SeaOrmStorage::in_memory().await;
        let (teacher_id, subject_id) = seed_catalog(&storage).await;

        storage
            .add_subject_teacher_impl(subject_id, teacher_id, false)
            .await
            .unwrap();
        let err = storage
            .add_subject_teacher_impl(subject_id, teacher_id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, CourseforgeError::Conflict(_)));
        // 冲突回滚，原有标记不变
        let roster = storage.list_subject_teachers_impl(subject_id).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert!(!roster[0].is_lead);
        assert_eq!(roster[0].teacher.full_name, "Tess Ower");

        assert!(storage.remove_subject_teacher_impl(subject_id, teacher_id).await.unwrap());
        assert!(!storage.remove_subject_teacher_impl(subject_id, teacher_id).await.unwrap());
        assert!(storage.list_subject_teachers_impl(subject_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_lead_per_subject() {
        let storage = SeaOrmStorage::in_memory().await;
        let (teacher_id, subject_id) = seed_catalog(&storage).await;
        let other = second_teacher(&storage).await;

        storage
            .add_subject_teacher_impl(subject_id, teacher_id, true)
            .await
            .unwrap();
        storage.add_subject_teacher_impl(subject_id, other, false).await.unwrap();
        assert!(storage.set_subject_lead_teacher_impl(subject_id, other).await.unwrap());

        let roster = storage.list_subject_teachers_impl(subject_id).await.unwrap();
        let leads: Vec<_> = roster.iter().filter(|t| t.is_lead).map(|t| t.teacher.id).collect();
        assert_eq!(leads, vec![other]);
        assert_eq!(roster[0].teacher.id, other);

        // 不在名单中的教师不能成为负责人
        assert!(!storage.set_subject_lead_teacher_impl(subject_id, other + 100).await.unwrap());
        let roster = storage.list_subject_teachers_impl(subject_id).await.unwrap();
        assert_eq!(roster.iter().filter(|t| t.is_lead).count(), 1);
    }

    #[tokio::test]
    async fn test_subjects_of_teacher() {
        let storage = SeaOrmStorage::in_memory().await;
        let (teacher_id, os) = seed_catalog(&storage).await;
        let db = storage
            .create_subject_impl(CreateSubjectRequest {
                name: "Databases".into(),
                code: "DB101".into(),
                description: None,
                semester: 3,
            })
            .await
            .unwrap()
            .id;
        let other = second_teacher(&storage).await;

        assert!(storage.list_subjects_by_teacher_impl(teacher_id).await.unwrap().is_empty());
        storage.add_subject_teacher_impl(os, teacher_id, false).await.unwrap();
        storage.add_subject_teacher_impl(db, teacher_id, true).await.unwrap();
        storage.add_subject_teacher_impl(db, other, false).await.unwrap();

        let codes: Vec<_> = storage
            .list_subjects_by_teacher_impl(teacher_id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.code)
            .collect();
        assert_eq!(codes, vec!["DB101".to_string(), "OS201".to_string()]);
        assert_eq!(storage.list_subjects_by_teacher_impl(other).await.unwrap().len(), 1);
    }
}
